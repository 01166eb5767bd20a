//! Time bucketing in the report time zone.
//!
//! Samples carry epoch-second timestamps; every boundary decision (bucket
//! floors, range bounds, month ranges) happens on Jakarta wall time so that
//! day and hour edges line up with what the operators see.

use chrono::{
    DateTime, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::config::{REPORT_TZ, SAMPLE_INTERVAL_HOURS};
use crate::error::AppError;

/// Report granularities. The bucket key is the local wall-clock start of
/// the bucket, which keeps sorting chronological without re-parsing labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
    TwoMinute,
    Hourly,
    Daily,
}

impl Granularity {
    /// Floors a local timestamp to the start of its bucket.
    pub fn floor(self, local: NaiveDateTime) -> NaiveDateTime {
        let date = local.date();
        let floored = match self {
            Granularity::TwoMinute => {
                date.and_hms_opt(local.hour(), local.minute() - local.minute() % 2, 0)
            }
            Granularity::Hourly => date.and_hms_opt(local.hour(), 0, 0),
            Granularity::Daily => date.and_hms_opt(0, 0, 0),
        };
        // hour/minute were read off a valid timestamp
        floored.unwrap_or(local)
    }

    /// Wire label for a bucket start.
    pub fn label(self, start: NaiveDateTime) -> String {
        match self {
            Granularity::TwoMinute => start.format("%Y-%m-%d %H:%M").to_string(),
            Granularity::Hourly => start.format("%Y-%m-%d %H:00").to_string(),
            Granularity::Daily => start.format("%Y-%m-%d").to_string(),
        }
    }

    /// Sampling interval feeding the flow volume integral. The device logs
    /// every two minutes at every report granularity.
    pub fn sample_interval_hours(self) -> f64 {
        SAMPLE_INTERVAL_HOURS
    }
}

/// Inclusive report bounds in the report time zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportRange {
    pub from: DateTime<Tz>,
    pub to: DateTime<Tz>,
}

impl ReportRange {
    pub fn contains(&self, ts: DateTime<Tz>) -> bool {
        self.from <= ts && ts <= self.to
    }

    pub fn from_utc(&self) -> DateTime<Utc> {
        self.from.with_timezone(&Utc)
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.to.with_timezone(&Utc)
    }
}

/// Converts device epoch seconds into the report zone. `None` only for
/// timestamps chrono cannot represent.
pub fn to_local(epoch_seconds: i64) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp(epoch_seconds, 0).map(|dt| dt.with_timezone(&REPORT_TZ))
}

/// Parses caller-supplied range bounds. Both bounds are required and must
/// parse; anything else aborts the whole report with an invalid-parameter
/// error rather than silently defaulting.
pub fn parse_range(from_date: Option<&str>, to_date: Option<&str>) -> Result<ReportRange, AppError> {
    let (Some(from_raw), Some(to_raw)) = (from_date, to_date) else {
        return Err(AppError::InvalidParams(
            "from_date and to_date are required".to_owned(),
        ));
    };
    let from = parse_bound(from_raw, false)
        .ok_or_else(|| AppError::InvalidParams(format!("unparseable from_date: {from_raw}")))?;
    let to = parse_bound(to_raw, true)
        .ok_or_else(|| AppError::InvalidParams(format!("unparseable to_date: {to_raw}")))?;
    if from > to {
        return Err(AppError::InvalidParams(
            "from_date is after to_date".to_owned(),
        ));
    }
    Ok(ReportRange { from, to })
}

/// Full-month range for daily reports: first day 00:00:00 through last day
/// 23:59:59 local time.
pub fn month_range(month: Option<u32>, year: Option<i32>) -> Result<ReportRange, AppError> {
    let (Some(month), Some(year)) = (month, year) else {
        return Err(AppError::InvalidParams(
            "month and year are required".to_owned(),
        ));
    };
    let bounds = NaiveDate::from_ymd_opt(year, month, 1).and_then(|first| {
        let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
        let from = resolve_local(first.and_time(NaiveTime::MIN))?;
        let to = resolve_local(last.and_time(NaiveTime::from_hms_opt(23, 59, 59)?))?;
        Some((from, to))
    });
    let (from, to) = bounds
        .ok_or_else(|| AppError::InvalidParams(format!("invalid month/year: {month}/{year}")))?;
    Ok(ReportRange { from, to })
}

/// Accepted bound formats: RFC 3339 (explicit offset, converted), ISO
/// date-time without an offset (read as local wall time), or a bare date.
/// A date-only `to` bound extends to the end of that day.
fn parse_bound(raw: &str, end_of_day: bool) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&REPORT_TZ));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
            let time = if end_of_day {
                NaiveTime::from_hms_opt(23, 59, 59)?
            } else {
                NaiveTime::MIN
            };
            Some(date.and_time(time))
        })?;
    resolve_local(naive)
}

/// Jakarta has no DST; still, ambiguous wall times resolve to the earliest
/// instant and nonexistent ones are rejected.
fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match REPORT_TZ.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}
