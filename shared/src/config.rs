use std::{env, path::Path};

use anyhow::{Context, Result};

pub struct ServiceConfig {
    /// Connection string for the datalogger database
    pub database_url: String,
    /// Address the HTTP listener binds to
    pub bind_addr: String,
    /// Origins allowed by the CORS layer; empty means same-origin only
    pub allowed_origins: Vec<String>,
}

impl ServiceConfig {
    pub fn load(manifest_dir: &Path) -> Result<Self> {
        #[cfg(debug_assertions)]
        dotenvy::from_path(manifest_dir.join(".env")).context("Can't find .env file")?;
        #[cfg(not(debug_assertions))]
        let _ = manifest_dir;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("Expected DATABASE_URL in environment")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned()),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|origin| origin.trim().to_owned())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

/// Load service config using the calling crate's manifest directory.
#[macro_export]
macro_rules! load_service_config {
    () => {
        $crate::config::ServiceConfig::load(std::path::Path::new(env!("CARGO_MANIFEST_DIR")))
    };
}
