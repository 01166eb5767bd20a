//! Read side of the datalogger table.
//!
//! The table is append-only from the service's point of view; this module is
//! the only touchpoint. Rows come back newest key first, which is not
//! chronological order; the aggregator does not care.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::mysql::MySqlPool;

/// One persisted datalogger row. `message` holds the raw payload text; rows
/// with a NULL message never leave the store.
#[derive(Clone, Debug, FromRow)]
pub struct RawRow {
    pub id: u64,
    pub datetime: DateTime<Utc>,
    pub message: Option<String>,
}

/// Fetches every candidate row for the given bounds, newest key first.
///
/// The SQL bounds trim the scan on the row's own `datetime`; the in-memory
/// filter on payload timestamps stays authoritative because the two can
/// disagree by a logging delay.
pub async fn fetch_rows(
    pool: &MySqlPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<RawRow>, sqlx::Error> {
    sqlx::query_as::<_, RawRow>(
        "SELECT id, datetime, message FROM datalogger_refrences_hourly \
         WHERE message IS NOT NULL AND datetime >= ? AND datetime <= ? \
         ORDER BY id DESC",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}
