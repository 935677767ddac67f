//! Integration tests for shopmetrics.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no database needed)
//! cargo test -p shopmetrics-integration-tests
//!
//! # Against a running server as well
//! ANALYTICS_BASE_URL=http://localhost:5000 cargo test -p shopmetrics-integration-tests -- --ignored
//! ```
//!
//! # Fixtures
//!
//! - [`spawn_app`] - the real router over a [`MemoryStore`] on an ephemeral port
//! - [`spawn_mock_geocoder`] - an HTTP stand-in for the `OpenCage` API
//! - [`sample_orders`] / [`sample_customers`] - a small shop with known totals

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use shopmetrics_core::{
    Address, CustomerId, CustomerRecord, MoneySet, OrderCustomerRef, OrderId, OrderRecord,
    RawAmount, ShopMoney,
};
use shopmetrics_server::geocode::Geocoder;
use shopmetrics_server::metrics::{GeocodeSettings, MetricsEngine};
use shopmetrics_server::state::AppState;
use shopmetrics_server::store::MemoryStore;
use tokio::net::TcpListener;

/// API key the mock geocoder accepts.
pub const MOCK_GEOCODER_KEY: &str = "4f1c9a7be2d84c61a0b3e95d7c2f8a16";

/// Base URL of an externally started server (for `#[ignore]` tests).
#[must_use]
pub fn analytics_base_url() -> String {
    std::env::var("ANALYTICS_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
}

impl TestServer {
    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

async fn serve(router: Router) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    TestServer { addr }
}

/// Start the analytics router over `store` with the given geocoder.
pub async fn spawn_app(
    store: MemoryStore,
    geocoder: Arc<dyn Geocoder>,
    settings: GeocodeSettings,
) -> TestServer {
    let engine = MetricsEngine::new(Arc::new(store), geocoder, settings);
    serve(shopmetrics_server::app(AppState::new(engine))).await
}

#[derive(Debug, Deserialize)]
struct GeocodeQuery {
    q: String,
    key: String,
}

/// Start a fake `GET /geocode/v1/json` endpoint.
///
/// Known cities answer with their coordinates, unknown ones with an empty
/// result list. A wrong key gets 401. `"Slowtown"` answers after 30 seconds.
pub async fn spawn_mock_geocoder(cities: &[(&str, f64, f64)]) -> TestServer {
    let table: Arc<HashMap<String, (f64, f64)>> = Arc::new(
        cities
            .iter()
            .map(|(name, lat, lng)| ((*name).to_string(), (*lat, *lng)))
            .collect(),
    );

    let router = Router::new().route(
        "/geocode/v1/json",
        get(move |Query(query): Query<GeocodeQuery>| {
            let table = Arc::clone(&table);
            async move { mock_geocode(&table, query).await }
        }),
    );
    serve(router).await
}

async fn mock_geocode(table: &HashMap<String, (f64, f64)>, query: GeocodeQuery) -> Response {
    if query.key != MOCK_GEOCODER_KEY {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": {"code": 401, "message": "invalid API key"}})),
        )
            .into_response();
    }
    if query.q == "Slowtown" {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }

    let results = table.get(&query.q).map_or_else(Vec::new, |(lat, lng)| {
        vec![json!({"geometry": {"lat": lat, "lng": lng}, "formatted": query.q})]
    });
    Json(json!({"results": results, "status": {"code": 200, "message": "OK"}})).into_response()
}

fn ts(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap()
}

fn order(id: i64, created_at: &str, amount: &str, customer: Option<i64>) -> OrderRecord {
    OrderRecord {
        id: OrderId::new(id),
        created_at: ts(created_at),
        total_price: Some(RawAmount::new(amount)),
        total_price_set: Some(MoneySet {
            shop_money: Some(ShopMoney {
                amount: Some(RawAmount::new(amount)),
                currency_code: Some("USD".to_string()),
            }),
        }),
        customer: customer.map(|id| OrderCustomerRef {
            id: Some(CustomerId::new(id)),
            email: None,
        }),
    }
}

fn customer(id: i64, created_at: &str, city: Option<&str>) -> CustomerRecord {
    CustomerRecord {
        id: CustomerId::new(id),
        email: Some(format!("shopper{id}@example.com")),
        created_at: ts(created_at),
        default_address: city.map(|city| Address {
            city: Some(city.to_string()),
            country: Some("US".to_string()),
        }),
    }
}

/// Orders spanning 2023-Q4 to 2024-Q2.
///
/// | Month   | Orders (customer)                  | Sales  |
/// |---------|------------------------------------|--------|
/// | 2023-11 | 101 (1)                            | 80.00  |
/// | 2023-12 | 102 (1), 103 (1), 104 (2)          | 120.50 |
/// | 2024-01 | 105 (guest), 106 (3)               | 0.00   |
/// | 2024-03 | 107 (2), 108 (2), 109 (4, unknown) | 300.00 |
#[must_use]
pub fn sample_orders() -> Vec<OrderRecord> {
    vec![
        order(101, "2023-11-20T15:00:00Z", "80.00", Some(1)),
        order(102, "2023-12-01T09:30:00Z", "40.25", Some(1)),
        order(103, "2023-12-24T18:00:00Z", "40.25", Some(1)),
        order(104, "2023-12-31T23:59:59Z", "40.00", Some(2)),
        order(105, "2024-01-02T10:00:00Z", "0.00", None),
        order(106, "2024-01-15T10:00:00Z", "0", Some(3)),
        order(107, "2024-03-03T08:00:00Z", "100.00", Some(2)),
        order(108, "2024-03-04T08:00:00Z", "150.00", Some(2)),
        order(109, "2024-03-05T08:00:00Z", "50.00", Some(4)),
    ]
}

/// Customers 1-3; customer 4 referenced by order 109 does not exist.
#[must_use]
pub fn sample_customers() -> Vec<CustomerRecord> {
    vec![
        customer(1, "2023-10-05T12:00:00Z", Some("Austin")),
        customer(2, "2023-12-30T12:00:00Z", Some("Austin")),
        customer(3, "2024-01-10T12:00:00Z", None),
    ]
}

/// [`MemoryStore`] over the sample shop.
#[must_use]
pub fn sample_store() -> MemoryStore {
    MemoryStore::new(sample_orders(), sample_customers())
}
