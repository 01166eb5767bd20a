//! Behavioral constants for bucketing, rounding, and pagination.

use chrono_tz::Tz;

/// All bucket boundaries and report labels are computed in this zone.
pub const REPORT_TZ: Tz = chrono_tz::Asia::Jakarta;

/// Device logging cadence: one sample every two minutes.
pub const SAMPLE_INTERVAL_HOURS: f64 = 2.0 / 60.0;

/// Decimal places applied once when a bucket is finalized.
pub const FLOW_DECIMALS: u32 = 3;
pub const CHEM_DECIMALS: u32 = 2;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 1000;
