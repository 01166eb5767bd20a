//! HTTP handlers: request parsing and response shaping around the report
//! pipeline. Everything heavy happens in `aggregate`/`report`/`export`.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::bucket::{self, Granularity, ReportRange};
use crate::error::AppError;
use crate::export;
use crate::report::{self, Pagination, ReportPage};
use crate::state::AppState;
use crate::{aggregate, store};

#[derive(Deserialize)]
pub struct RangeRequest {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Deserialize)]
pub struct MonthRequest {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

pub async fn data_two_minute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RangeRequest>,
) -> Result<Json<ReportPage>, AppError> {
    let range = bucket::parse_range(req.from_date.as_deref(), req.to_date.as_deref())?;
    let pagination = Pagination::new(req.page, req.per_page)?;
    range_report(&state, range, pagination, Granularity::TwoMinute).await
}

pub async fn data_hourly(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RangeRequest>,
) -> Result<Json<ReportPage>, AppError> {
    let range = bucket::parse_range(req.from_date.as_deref(), req.to_date.as_deref())?;
    let pagination = Pagination::new(req.page, req.per_page)?;
    range_report(&state, range, pagination, Granularity::Hourly).await
}

pub async fn data_daily(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MonthRequest>,
) -> Result<Json<ReportPage>, AppError> {
    let range = bucket::month_range(req.month, req.year)?;
    let pagination = Pagination::new(req.page, req.per_page)?;
    range_report(&state, range, pagination, Granularity::Daily).await
}

async fn range_report(
    state: &AppState,
    range: ReportRange,
    pagination: Pagination,
    granularity: Granularity,
) -> Result<Json<ReportPage>, AppError> {
    let rows = store::fetch_rows(&state.pool, range.from_utc(), range.to_utc()).await?;
    let buckets = aggregate::aggregate_rows(&rows, &range, granularity);
    Ok(Json(report::assemble(buckets, granularity, pagination)))
}

/// Verbatim per-sample export: every reading in range, no aggregation.
pub async fn download_two_minute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RangeRequest>,
) -> Result<Response, AppError> {
    let range = bucket::parse_range(req.from_date.as_deref(), req.to_date.as_deref())?;
    let rows = store::fetch_rows(&state.pool, range.from_utc(), range.to_utc()).await?;
    let samples = export::collect_samples(&rows, &range);
    let body = export::render_samples(&samples);
    let filename = format!(
        "report_{}_to_{}.csv",
        range.from.format("%Y%m%d"),
        range.to.format("%Y%m%d")
    );
    Ok(attachment(&filename, body))
}

pub async fn download_hourly(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RangeRequest>,
) -> Result<Response, AppError> {
    let range = bucket::parse_range(req.from_date.as_deref(), req.to_date.as_deref())?;
    let body = aggregated_export(&state, &range, Granularity::Hourly).await?;
    let filename = format!(
        "report_hourly_{}_to_{}.csv",
        range.from.format("%Y%m%d"),
        range.to.format("%Y%m%d")
    );
    Ok(attachment(&filename, body))
}

pub async fn download_daily(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MonthRequest>,
) -> Result<Response, AppError> {
    let range = bucket::month_range(req.month, req.year)?;
    let body = aggregated_export(&state, &range, Granularity::Daily).await?;
    let filename = format!(
        "report_daily_{}_{}.csv",
        range.from.format("%Y"),
        range.from.format("%-m")
    );
    Ok(attachment(&filename, body))
}

async fn aggregated_export(
    state: &AppState,
    range: &ReportRange,
    granularity: Granularity,
) -> Result<Vec<u8>, AppError> {
    let rows = store::fetch_rows(&state.pool, range.from_utc(), range.to_utc()).await?;
    let buckets = aggregate::aggregate_rows(&rows, range, granularity);
    Ok(export::render_aggregated(&report::sorted_rows(
        buckets,
        granularity,
    )))
}

fn attachment(filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    )
        .into_response()
}
