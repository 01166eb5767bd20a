use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Request-fatal failures. Malformed stored messages are not represented
/// here: those are skipped row by row and never abort a report.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("store query failed: {0}")]
    Store(#[from] sqlx::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidParams(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Store(e) => {
                error!("store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
