//! Unified error handling for the analytics API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::metrics::MetricsError;

/// Application-level error type for the analytics API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A metric could not be computed.
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Analytics request error"
        );

        // Don't expose internal error details to clients
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response()
    }
}
