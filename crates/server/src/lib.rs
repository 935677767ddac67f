//! Shopmetrics analytics server library.
//!
//! Serves the dashboard metrics as JSON under `/api/analytics/*`. The binary
//! in `main.rs` wires configuration, the `PostgreSQL` store and the geocoder;
//! everything else lives here so it can be exercised in-process with a
//! [`store::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod geocode;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod store;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use state::AppState;

/// Build the full application router: routes, CORS and request tracing.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
