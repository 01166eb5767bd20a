//! Per-bucket accumulation over parsed samples.
//!
//! Rows arrive in whatever order the store hands them out (newest key
//! first); accumulation is order-free and the assembler sorts afterwards.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::bucket::{self, Granularity, ReportRange};
use crate::config::{CHEM_DECIMALS, FLOW_DECIMALS};
use crate::message::{self, ParsedSample};
use crate::store::RawRow;

/// One finalized bucket, still unordered. `count` is at least 1: buckets
/// only exist once a sample has contributed to them.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketedRow {
    /// Local wall-clock start of the bucket
    pub start: NaiveDateTime,
    pub ph: f64,
    pub cod: f64,
    pub tss: f64,
    pub nh3n: f64,
    pub debit: f64,
    /// Flow volume integral, a plain total rather than a mean
    pub volume: f64,
    pub count: u32,
}

#[derive(Default)]
struct Accumulator {
    ph: f64,
    cod: f64,
    tss: f64,
    nh3n: f64,
    debit: f64,
    volume: f64,
    count: u32,
}

impl Accumulator {
    fn add(&mut self, sample: &ParsedSample, interval_hours: f64) {
        self.count += 1;
        self.ph += sample.ph.unwrap_or(0.0);
        self.cod += sample.cod.unwrap_or(0.0);
        self.tss += sample.tss.unwrap_or(0.0);
        self.nh3n += sample.nh3n.unwrap_or(0.0);
        self.debit += sample.debit.unwrap_or(0.0);
        self.volume += sample.debit.unwrap_or(0.0) * interval_hours;
    }

    fn finalize(self, start: NaiveDateTime) -> BucketedRow {
        // count >= 1: accumulators are created on first contribution
        let count = f64::from(self.count);
        BucketedRow {
            start,
            ph: round_to(self.ph / count, CHEM_DECIMALS),
            cod: round_to(self.cod / count, CHEM_DECIMALS),
            tss: round_to(self.tss / count, CHEM_DECIMALS),
            nh3n: round_to(self.nh3n / count, CHEM_DECIMALS),
            debit: round_to(self.debit / count, FLOW_DECIMALS),
            volume: round_to(self.volume, FLOW_DECIMALS),
            count: self.count,
        }
    }
}

/// Parses, range-filters, buckets, and accumulates every sample in `rows`.
/// Pure function of its inputs; identical reruns give identical buckets.
pub fn aggregate_rows(
    rows: &[RawRow],
    range: &ReportRange,
    granularity: Granularity,
) -> Vec<BucketedRow> {
    let mut buckets: HashMap<NaiveDateTime, Accumulator> = HashMap::new();
    let interval_hours = granularity.sample_interval_hours();

    for row in rows {
        let Some(raw) = row.message.as_deref() else {
            continue;
        };
        for sample in message::decode_message(raw) {
            let Some(ts) = bucket::to_local(sample.datetime) else {
                continue;
            };
            if !range.contains(ts) {
                continue;
            }
            let key = granularity.floor(ts.naive_local());
            buckets.entry(key).or_default().add(&sample, interval_hours);
        }
    }

    buckets
        .into_iter()
        .map(|(start, acc)| acc.finalize(start))
        .collect()
}

/// Presentation rounding, applied once at finalization so accumulation never
/// compounds rounding error.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::parse_range;
    use chrono::{DateTime, Utc};

    fn row(id: u64, message: Option<&str>) -> RawRow {
        RawRow {
            id,
            datetime: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            message: message.map(str::to_owned),
        }
    }

    fn epoch_day_range() -> ReportRange {
        // Covers Jakarta 1970-01-01, which contains the small epoch values
        // used below (epoch 0 is 07:00 local).
        parse_range(Some("1970-01-01"), Some("1970-01-01")).unwrap()
    }

    #[test]
    fn string_debit_yields_one_hourly_bucket() {
        let rows = vec![row(1, Some("{'data':[{'datetime':100,'debit':'5'}]}"))];
        let buckets = aggregate_rows(&rows, &epoch_day_range(), Granularity::Hourly);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].debit, 5.0);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(Granularity::Hourly.label(buckets[0].start), "1970-01-01 07:00");
    }

    #[test]
    fn two_samples_share_a_two_minute_bucket() {
        // epoch 120 and 180 are 07:02:00 and 07:03:00 local
        let rows = vec![row(
            1,
            Some("{'data':[{'datetime':120,'debit':3},{'datetime':180,'debit':7}]}"),
        )];
        let buckets = aggregate_rows(&rows, &epoch_day_range(), Granularity::TwoMinute);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].debit, 5.0);
        // 3/30 + 7/30 hours of flow
        assert_eq!(buckets[0].volume, 0.333);
    }

    #[test]
    fn malformed_row_is_skipped_without_poisoning_the_rest() {
        let rows = vec![
            row(2, Some("{not json")),
            row(1, Some("{'data':[{'datetime':100,'debit':4}]}")),
        ];
        let buckets = aggregate_rows(&rows, &epoch_day_range(), Granularity::Hourly);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].debit, 4.0);
    }

    #[test]
    fn null_message_rows_contribute_nothing() {
        let rows = vec![row(1, None)];
        assert!(aggregate_rows(&rows, &epoch_day_range(), Granularity::Hourly).is_empty());
    }

    #[test]
    fn out_of_range_samples_are_excluded_before_bucketing() {
        // epoch 100_000 is 1970-01-02 local, outside the one-day range
        let rows = vec![row(
            1,
            Some("{'data':[{'datetime':100,'debit':1},{'datetime':100000,'debit':9}]}"),
        )];
        let buckets = aggregate_rows(&rows, &epoch_day_range(), Granularity::Hourly);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].debit, 1.0);
    }

    #[test]
    fn missing_values_count_as_zero_contribution() {
        let rows = vec![row(
            1,
            Some("{'data':[{'datetime':120,'debit':3},{'datetime':121,'pH':'x'}]}"),
        )];
        let buckets = aggregate_rows(&rows, &epoch_day_range(), Granularity::TwoMinute);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].debit, 1.5);
        assert_eq!(buckets[0].ph, 0.0);
    }

    #[test]
    fn row_order_does_not_change_the_result() {
        let a = row(1, Some("{'data':[{'datetime':100,'debit':2,'cod':10}]}"));
        let b = row(2, Some("{'data':[{'datetime':200,'debit':4,'cod':20}]}"));
        let range = epoch_day_range();

        let mut forward = aggregate_rows(&[a.clone(), b.clone()], &range, Granularity::Hourly);
        let mut reverse = aggregate_rows(&[b, a], &range, Granularity::Hourly);
        forward.sort_by_key(|r| r.start);
        reverse.sort_by_key(|r| r.start);

        assert_eq!(forward, reverse);
    }

    #[test]
    fn bucket_starts_stay_inside_the_range() {
        let rows = vec![row(
            1,
            Some("{'data':[{'datetime':100,'debit':1},{'datetime':43200,'debit':2}]}"),
        )];
        let range = epoch_day_range();
        let buckets = aggregate_rows(&rows, &range, Granularity::Hourly);

        assert_eq!(buckets.len(), 2);
        for bucket in &buckets {
            assert!(bucket.start >= Granularity::Hourly.floor(range.from.naive_local()));
            assert!(bucket.start <= range.to.naive_local());
            assert!(bucket.count >= 1);
        }
    }
}
