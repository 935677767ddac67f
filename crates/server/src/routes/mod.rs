//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                    - Liveness check
//! GET  /health/ready                              - Readiness check (store ping)
//!
//! # Analytics (all accept ?interval=daily|monthly|quarterly|yearly)
//! GET  /api/analytics/total-sales                 - Sales per bucket
//! GET  /api/analytics/sales-growth-rate           - Sales and growth per bucket
//! GET  /api/analytics/new-customers               - Signups per bucket
//! GET  /api/analytics/repeat-customers            - Repeat buyers per bucket
//! GET  /api/analytics/customer-lifetime-value     - Lifetime value per signup cohort
//! GET  /api/analytics/geographical-distribution   - Customers per city (no interval)
//! ```

pub mod analytics;
pub mod health;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Build the router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/analytics", analytics_routes())
}

fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/total-sales", get(analytics::total_sales))
        .route("/sales-growth-rate", get(analytics::sales_growth_rate))
        .route("/new-customers", get(analytics::new_customers))
        .route("/repeat-customers", get(analytics::repeat_customers))
        .route(
            "/customer-lifetime-value",
            get(analytics::customer_lifetime_value),
        )
        .route(
            "/geographical-distribution",
            get(analytics::geographical_distribution),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{self, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use shopmetrics_core::{CustomerRecord, OrderRecord, RawAmount};
    use tower::ServiceExt; // for `oneshot`

    use super::*;
    use crate::geocode::{Coordinates, GeocodeError, Geocoder};
    use crate::metrics::testing::{customer, order};
    use crate::metrics::{GeocodeSettings, MetricsEngine};
    use crate::store::{MemoryStore, OrderStore, OrderWithCustomer, StoreError};

    struct TableGeocoder;

    #[async_trait]
    impl Geocoder for TableGeocoder {
        async fn resolve_city(&self, name: &str) -> Result<Coordinates, GeocodeError> {
            match name {
                "Lisbon" => Ok(Coordinates { lat: 38.72, lng: -9.14 }),
                "Porto" => Ok(Coordinates { lat: 41.15, lng: -8.61 }),
                _ => Err(GeocodeError::NoResult(name.to_string())),
            }
        }
    }

    struct DownStore;

    #[async_trait]
    impl OrderStore for DownStore {
        async fn orders(&self) -> Result<Vec<OrderRecord>, StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }

        async fn customers(&self) -> Result<Vec<CustomerRecord>, StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }

        async fn orders_with_customers(&self) -> Result<Vec<OrderWithCustomer>, StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }
    }

    fn sample_store() -> MemoryStore {
        MemoryStore::new(
            vec![
                order(1, "2024-01-05", "120.50", Some(1)),
                order(2, "2024-01-20", "79.50", Some(1)),
                order(3, "2024-02-11", "300", Some(2)),
                order(4, "2024-04-02", "150", None),
            ],
            vec![
                customer(1, "2023-12-30", Some("Lisbon")),
                customer(2, "2024-01-15", Some("Porto")),
                customer(3, "2024-01-16", Some("Lisbon")),
                customer(4, "2024-02-01", Some("Faro")),
            ],
        )
    }

    fn app_with(store: Arc<dyn OrderStore>) -> Router {
        let engine = MetricsEngine::new(store, Arc::new(TableGeocoder), GeocodeSettings::default());
        crate::app(AppState::new(engine))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_total_sales_defaults_to_monthly() {
        let (status, body) =
            get_json(app_with(Arc::new(sample_store())), "/api/analytics/total-sales").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"_id": "2024-01", "totalSales": 200},
                {"_id": "2024-02", "totalSales": 300},
                {"_id": "2024-04", "totalSales": 150},
            ])
        );
    }

    #[tokio::test]
    async fn test_sales_growth_rate_quarterly() {
        let (status, body) = get_json(
            app_with(Arc::new(sample_store())),
            "/api/analytics/sales-growth-rate?interval=quarterly",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"_id": "2024-Q1", "totalSales": 500, "growthRate": 0.0},
                {"_id": "2024-Q2", "totalSales": 150, "growthRate": -70.0},
            ])
        );
    }

    #[tokio::test]
    async fn test_unknown_interval_buckets_daily() {
        let (status, body) = get_json(
            app_with(Arc::new(sample_store())),
            "/api/analytics/new-customers?interval=fortnightly",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"_id": "2023-12-30", "newCustomers": 1},
                {"_id": "2024-01-15", "newCustomers": 1},
                {"_id": "2024-01-16", "newCustomers": 1},
                {"_id": "2024-02-01", "newCustomers": 1},
            ])
        );
    }

    #[tokio::test]
    async fn test_repeated_interval_buckets_daily() {
        let (status, body) = get_json(
            app_with(Arc::new(sample_store())),
            "/api/analytics/new-customers?interval=monthly&interval=yearly",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"_id": "2023-12-30", "newCustomers": 1},
                {"_id": "2024-01-15", "newCustomers": 1},
                {"_id": "2024-01-16", "newCustomers": 1},
                {"_id": "2024-02-01", "newCustomers": 1},
            ])
        );

        let (status, _) = get_json(
            app_with(Arc::new(sample_store())),
            "/api/analytics/total-sales?interval=monthly&interval=yearly",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_repeat_customers() {
        let (status, body) = get_json(
            app_with(Arc::new(sample_store())),
            "/api/analytics/repeat-customers?interval=monthly",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"_id": "2024-01", "repeatCustomers": 1}]));
    }

    #[tokio::test]
    async fn test_customer_lifetime_value_cohorts() {
        let (status, body) = get_json(
            app_with(Arc::new(sample_store())),
            "/api/analytics/customer-lifetime-value?interval=yearly",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"_id": {"cohort": "2023-12", "date": null}, "totalLifetimeValue": 200},
                {"_id": {"cohort": "2024-01", "date": null}, "totalLifetimeValue": 300},
            ])
        );
    }

    #[tokio::test]
    async fn test_geographical_distribution_with_failed_lookup() {
        let (status, body) = get_json(
            app_with(Arc::new(sample_store())),
            "/api/analytics/geographical-distribution",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"name": "Lisbon", "customerCount": 2, "lat": 38.72, "lng": -9.14},
                {"name": "Faro", "customerCount": 1, "lat": 0.0, "lng": 0.0},
                {"name": "Porto", "customerCount": 1, "lat": 41.15, "lng": -8.61},
            ])
        );
    }

    #[tokio::test]
    async fn test_bad_amount_is_opaque_500() {
        let mut bad = order(9, "2024-01-01", "1", None);
        bad.total_price_set.as_mut().unwrap().shop_money.as_mut().unwrap().amount =
            Some(RawAmount::new("twelve"));
        let store = MemoryStore::new(vec![bad], vec![]);

        let (status, body) = get_json(app_with(Arc::new(store)), "/api/analytics/total-sales").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_store_outage_is_opaque_500() {
        for uri in [
            "/api/analytics/total-sales",
            "/api/analytics/sales-growth-rate",
            "/api/analytics/new-customers",
            "/api/analytics/repeat-customers",
            "/api/analytics/customer-lifetime-value",
            "/api/analytics/geographical-distribution",
        ] {
            let (status, body) = get_json(app_with(Arc::new(DownStore)), uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body, json!({"error": "Internal server error"}), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_health_probes() {
        let app = app_with(Arc::new(MemoryStore::default()));
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app_with(Arc::new(DownStore))
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
