use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default
/// `info` filter.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(anyhow::Error::msg)
        .context("Failed to install tracing subscriber")
}

/// Initialize tracing for a service binary.
#[macro_export]
macro_rules! init_tracing {
    () => {
        $crate::telemetry::init()
    };
}
