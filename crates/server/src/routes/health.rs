//! Liveness and readiness probes.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;
use crate::store::{OrderStore, StoreError};

/// Longest a readiness ping may take before the store counts as down.
const READINESS_TIMEOUT: Duration = Duration::from_secs(2);

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Pings the order store; returns 503 Service Unavailable if it is not reachable
/// or does not answer in time.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match ping_within(state.store(), READINESS_TIMEOUT).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn ping_within(store: &dyn OrderStore, limit: Duration) -> Result<(), StoreError> {
    tokio::time::timeout(limit, store.ping())
        .await
        .unwrap_or_else(|_| {
            Err(StoreError::Unavailable(format!(
                "ping timed out after {}ms",
                limit.as_millis()
            )))
        })
}
