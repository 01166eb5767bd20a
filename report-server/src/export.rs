//! Export rendering behind a fixed renderer seam.
//!
//! Every export takes an ordered sequence of rows plus the fixed header set
//! and returns a binary buffer the HTTP layer ships as an attachment. The
//! shipped renderer writes CSV; whatever workbook tooling the operators open
//! the file with is not this service's concern.

use chrono::NaiveDateTime;

use crate::bucket::{self, ReportRange};
use crate::message;
use crate::report::AggregatedRow;
use crate::store::RawRow;

/// Fixed column header set shared by every export.
pub const EXPORT_HEADERS: [&str; 6] = ["DATE", "pH", "COD", "TSS", "NH3-N", "Debit"];

/// One verbatim reading for the 2-minute export: no aggregation, and a
/// missing measurement stays an empty cell rather than a fabricated zero.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleRow {
    pub datetime: NaiveDateTime,
    pub ph: Option<f64>,
    pub cod: Option<f64>,
    pub tss: Option<f64>,
    pub nh3n: Option<f64>,
    pub debit: Option<f64>,
}

/// Decodes and range-filters every sample in `rows`, ordered by timestamp.
pub fn collect_samples(rows: &[RawRow], range: &ReportRange) -> Vec<SampleRow> {
    let mut samples: Vec<SampleRow> = rows
        .iter()
        .filter_map(|row| row.message.as_deref())
        .flat_map(message::decode_message)
        .filter_map(|sample| {
            let ts = bucket::to_local(sample.datetime)?;
            if !range.contains(ts) {
                return None;
            }
            Some(SampleRow {
                datetime: ts.naive_local(),
                ph: sample.ph,
                cod: sample.cod,
                tss: sample.tss,
                nh3n: sample.nh3n,
                debit: sample.debit,
            })
        })
        .collect();
    samples.sort_by_key(|s| s.datetime);
    samples
}

/// Renders verbatim readings, one line per sample.
pub fn render_samples(samples: &[SampleRow]) -> Vec<u8> {
    let mut output = header_line();
    for sample in samples {
        let record = [
            sample.datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            cell(sample.ph),
            cell(sample.cod),
            cell(sample.tss),
            cell(sample.nh3n),
            cell(sample.debit),
        ];
        output.push_str(&record.join(","));
        output.push('\n');
    }
    output.into_bytes()
}

/// Renders aggregated buckets, one line per bucket mean.
pub fn render_aggregated(rows: &[AggregatedRow]) -> Vec<u8> {
    let mut output = header_line();
    for row in rows {
        let record = [
            row.waktu.clone(),
            row.ph.to_string(),
            row.cod.to_string(),
            row.tss.to_string(),
            row.nh3n.to_string(),
            row.debit.to_string(),
        ];
        output.push_str(&record.join(","));
        output.push('\n');
    }
    output.into_bytes()
}

fn header_line() -> String {
    let mut line = EXPORT_HEADERS.join(",");
    line.push('\n');
    line
}

// No field ever contains the delimiter: timestamps and plain decimal
// numbers only, so quoting is unnecessary.
fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
