use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::post;
use sqlx::mysql::MySqlPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use crate::state::AppState;

mod aggregate;
mod bucket;
mod config;
mod error;
mod export;
mod message;
mod report;
mod routes;
mod state;
mod store;

#[tokio::main]
async fn main() -> Result<()> {
    shared::init_tracing!()?;
    let config = shared::load_service_config!()?;

    let pool = MySqlPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Error connecting to database")?;

    let state = Arc::new(AppState { pool });

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid origin in ALLOWED_ORIGINS: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .route("/data/2menit", post(routes::data_two_minute))
        .route("/data/hourly", post(routes::data_hourly))
        .route("/data/daily", post(routes::data_daily))
        .route("/download/2menit", post(routes::download_two_minute))
        .route("/download/hourly", post(routes::download_hourly))
        .route("/download/daily", post(routes::download_daily))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    info!("listening on {}", config.bind_addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
