//! Chronological assembly of finalized buckets into a report page.

use serde::Serialize;

use crate::aggregate::{BucketedRow, round_to};
use crate::bucket::Granularity;
use crate::config::{DEFAULT_PAGE, DEFAULT_PER_PAGE, FLOW_DECIMALS};
use crate::error::AppError;

/// One report line as it goes over the wire.
#[derive(Clone, Debug, Serialize)]
pub struct AggregatedRow {
    pub waktu: String,
    #[serde(rename = "pH")]
    pub ph: f64,
    pub cod: f64,
    pub tss: f64,
    pub nh3n: f64,
    pub debit: f64,
    pub volume: f64,
}

#[derive(Debug, Serialize)]
pub struct ReportPage {
    pub data: Vec<AggregatedRow>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    /// Sum of per-bucket debit means over the whole result, not the page
    pub total_debit: f64,
    /// Sum of per-bucket volume integrals over the whole result
    pub total_volume: f64,
}

/// Validated 1-based pagination window.
#[derive(Clone, Copy, Debug)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub fn new(page: Option<usize>, per_page: Option<usize>) -> Result<Self, AppError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
        if page == 0 || per_page == 0 {
            return Err(AppError::InvalidParams(
                "page and per_page must be at least 1".to_owned(),
            ));
        }
        Ok(Self { page, per_page })
    }
}

/// Sorts buckets chronologically and shapes them for the wire.
pub fn sorted_rows(mut buckets: Vec<BucketedRow>, granularity: Granularity) -> Vec<AggregatedRow> {
    buckets.sort_by_key(|b| b.start);
    buckets
        .into_iter()
        .map(|b| AggregatedRow {
            waktu: granularity.label(b.start),
            ph: b.ph,
            cod: b.cod,
            tss: b.tss,
            nh3n: b.nh3n,
            debit: b.debit,
            volume: b.volume,
        })
        .collect()
}

/// Builds the final page: chronological order, grand totals over the full
/// result, then the pagination slice. An empty result is an empty page, not
/// an error.
pub fn assemble(
    buckets: Vec<BucketedRow>,
    granularity: Granularity,
    pagination: Pagination,
) -> ReportPage {
    let rows = sorted_rows(buckets, granularity);
    let total = rows.len();
    let total_pages = total.div_ceil(pagination.per_page);
    let total_debit = round_to(rows.iter().map(|r| r.debit).sum(), FLOW_DECIMALS);
    let total_volume = round_to(rows.iter().map(|r| r.volume).sum(), FLOW_DECIMALS);

    let data = rows
        .into_iter()
        .skip((pagination.page - 1).saturating_mul(pagination.per_page))
        .take(pagination.per_page)
        .collect();

    ReportPage {
        data,
        page: pagination.page,
        per_page: pagination.per_page,
        total,
        total_pages,
        total_debit,
        total_volume,
    }
}
