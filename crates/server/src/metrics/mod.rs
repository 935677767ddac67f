//! Analytics metrics computed from order and customer snapshots.
//!
//! Each operation of [`MetricsEngine`] issues one read against the store and
//! then runs a pure computation from one of the submodules:
//!
//! - [`sales`] - per-bucket sales totals and the growth rate between buckets
//! - [`customers`] - new customers and repeat customers per bucket
//! - [`lifetime`] - customer lifetime value rolled up to signup cohorts
//! - [`geo`] - customers per city, enriched with coordinates
//!
//! Nothing is cached; every call recomputes from the store.

pub mod customers;
pub mod geo;
pub mod lifetime;
pub mod sales;

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use shopmetrics_core::{Interval, MoneyError, round_half_even, round_percent, round_to_unit};
use thiserror::Error;
use tracing::instrument;

use crate::geocode::Geocoder;
use crate::store::{OrderStore, StoreError};

pub use geo::GeocodeSettings;

/// Errors that can occur while computing a metric.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Reading from the store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A monetary field could not be parsed.
    #[error("invalid amount: {0}")]
    Money(#[from] MoneyError),

    /// A value does not fit the output type.
    #[error("value out of range: {0}")]
    Overflow(String),
}

// =============================================================================
// Output Rows
// =============================================================================

/// Sales total for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPoint {
    #[serde(rename = "_id")]
    pub bucket: String,
    pub total_sales: i64,
}

/// Sales total and growth against the previous present bucket.
///
/// `growth_rate` is `None` when the previous bucket's total is zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    #[serde(rename = "_id")]
    pub bucket: String,
    pub total_sales: i64,
    pub growth_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomersPoint {
    #[serde(rename = "_id")]
    pub bucket: String,
    pub new_customers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatCustomersPoint {
    #[serde(rename = "_id")]
    pub bucket: String,
    pub repeat_customers: u64,
}

/// Grouping key of a cohort rollup row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortKey {
    /// Signup month of the customers in this row (`YYYY-MM`).
    pub cohort: String,
    /// Rollup date bucket. Customer-level rows carry no timestamp, so this is
    /// always `null`.
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortValuePoint {
    #[serde(rename = "_id")]
    pub key: CohortKey,
    pub total_lifetime_value: i64,
}

/// Customers in one city. `name` is `None` for customers without a city.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPoint {
    pub name: Option<String>,
    pub customer_count: u64,
    pub lat: f64,
    pub lng: f64,
}

// =============================================================================
// Engine
// =============================================================================

/// Computes the dashboard metrics against an injected store and geocoder.
///
/// Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct MetricsEngine {
    store: Arc<dyn OrderStore>,
    geocoder: Arc<dyn Geocoder>,
    geocode: GeocodeSettings,
}

impl MetricsEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn OrderStore>,
        geocoder: Arc<dyn Geocoder>,
        geocode: GeocodeSettings,
    ) -> Self {
        Self {
            store,
            geocoder,
            geocode,
        }
    }

    /// The store the engine reads from.
    #[must_use]
    pub fn store(&self) -> &dyn OrderStore {
        self.store.as_ref()
    }

    /// Sales per bucket, rounded to whole currency units.
    ///
    /// # Errors
    ///
    /// Fails if the store read fails or an amount is not numeric.
    #[instrument(skip(self), fields(interval = %interval))]
    pub async fn total_sales(&self, interval: Interval) -> Result<Vec<SalesPoint>, MetricsError> {
        let orders = self.store.orders().await?;
        let totals = sales::bucket_totals(&orders, interval)?;

        let points = totals
            .into_iter()
            .map(|total| {
                Ok(SalesPoint {
                    total_sales: to_whole(round_to_unit(total.amount), &total.bucket)?,
                    bucket: total.bucket,
                })
            })
            .collect::<Result<Vec<_>, MetricsError>>()?;

        tracing::debug!(rows = points.len(), "computed total sales");
        Ok(points)
    }

    /// Sales per bucket with the percentage change against the previous bucket.
    ///
    /// # Errors
    ///
    /// Fails if the store read fails or an amount is not numeric.
    #[instrument(skip(self), fields(interval = %interval))]
    pub async fn sales_growth_rate(
        &self,
        interval: Interval,
    ) -> Result<Vec<GrowthPoint>, MetricsError> {
        let orders = self.store.orders().await?;
        let totals = sales::bucket_totals(&orders, interval)?;

        let points = sales::growth_rates(&totals)?
            .into_iter()
            .map(|row| {
                Ok(GrowthPoint {
                    total_sales: to_whole(round_to_unit(row.total), &row.bucket)?,
                    growth_rate: row
                        .growth_rate
                        .map(|rate| to_percent(rate, &row.bucket))
                        .transpose()?,
                    bucket: row.bucket,
                })
            })
            .collect::<Result<Vec<_>, MetricsError>>()?;

        tracing::debug!(rows = points.len(), "computed sales growth rate");
        Ok(points)
    }

    /// Customers who signed up in each bucket.
    ///
    /// # Errors
    ///
    /// Fails if the store read fails.
    #[instrument(skip(self), fields(interval = %interval))]
    pub async fn new_customers(
        &self,
        interval: Interval,
    ) -> Result<Vec<NewCustomersPoint>, MetricsError> {
        let signups = self.store.customers().await?;

        let points: Vec<_> = customers::count_new(&signups, interval)
            .into_iter()
            .map(|(bucket, new_customers)| NewCustomersPoint {
                bucket,
                new_customers,
            })
            .collect();

        tracing::debug!(rows = points.len(), "computed new customers");
        Ok(points)
    }

    /// Customers with more than one order inside the same bucket.
    ///
    /// # Errors
    ///
    /// Fails if the store read fails.
    #[instrument(skip(self), fields(interval = %interval))]
    pub async fn repeat_customers(
        &self,
        interval: Interval,
    ) -> Result<Vec<RepeatCustomersPoint>, MetricsError> {
        let orders = self.store.orders().await?;

        let points: Vec<_> = customers::count_repeat(&orders, interval)
            .into_iter()
            .map(|(bucket, repeat_customers)| RepeatCustomersPoint {
                bucket,
                repeat_customers,
            })
            .collect();

        tracing::debug!(rows = points.len(), "computed repeat customers");
        Ok(points)
    }

    /// Lifetime value summed per signup cohort.
    ///
    /// `interval` is accepted for parity with the other metrics; cohorts are
    /// always monthly and the rollup date is always `null` (see [`CohortKey`]).
    ///
    /// # Errors
    ///
    /// Fails if the store read fails or an order total is not numeric.
    #[instrument(skip(self), fields(interval = %interval))]
    pub async fn customer_lifetime_value(
        &self,
        interval: Interval,
    ) -> Result<Vec<CohortValuePoint>, MetricsError> {
        let joined = self.store.orders_with_customers().await?;
        let lifetimes = lifetime::customer_lifetimes(&joined)?;

        let points = lifetime::cohort_values(&lifetimes)
            .into_iter()
            .map(|row| {
                Ok(CohortValuePoint {
                    total_lifetime_value: to_whole(round_half_even(row.total), &row.cohort)?,
                    key: CohortKey {
                        cohort: row.cohort,
                        date: None,
                    },
                })
            })
            .collect::<Result<Vec<_>, MetricsError>>()?;

        tracing::debug!(rows = points.len(), "computed customer lifetime value");
        Ok(points)
    }

    /// Customers per city, most populous first, with coordinates.
    ///
    /// Coordinate lookups run concurrently; a failed or slow lookup yields
    /// `(0, 0)` for that city only.
    ///
    /// # Errors
    ///
    /// Fails only if the store read fails.
    #[instrument(skip(self))]
    pub async fn geographical_distribution(&self) -> Result<Vec<CityPoint>, MetricsError> {
        let records = self.store.customers().await?;
        let cities = geo::count_by_city(&records);

        let points = geo::enrich(cities, self.geocoder.as_ref(), &self.geocode).await;

        tracing::debug!(rows = points.len(), "computed geographical distribution");
        Ok(points)
    }
}

/// Convert an already-rounded amount to `i64`.
fn to_whole(amount: Decimal, label: &str) -> Result<i64, MetricsError> {
    amount
        .to_i64()
        .ok_or_else(|| MetricsError::Overflow(format!("{label}: {amount}")))
}

fn to_percent(rate: Decimal, label: &str) -> Result<f64, MetricsError> {
    let rounded = round_percent(rate);
    rounded
        .to_f64()
        .ok_or_else(|| MetricsError::Overflow(format!("{label}: {rounded}%")))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Record builders shared by the metric tests.

    use chrono::{DateTime, Utc};
    use shopmetrics_core::{
        Address, CustomerId, CustomerRecord, MoneySet, OrderCustomerRef, OrderId, OrderRecord,
        RawAmount, ShopMoney,
    };

    /// Noon UTC on a `YYYY-MM-DD` date.
    #[allow(clippy::unwrap_used)]
    pub fn ts(date: &str) -> DateTime<Utc> {
        format!("{date}T12:00:00Z").parse().unwrap()
    }

    pub fn order(id: i64, date: &str, amount: &str, customer: Option<i64>) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(id),
            created_at: ts(date),
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

    pub fn customer(id: i64, signup: &str, city: Option<&str>) -> CustomerRecord {
        CustomerRecord {
            id: CustomerId::new(id),
            email: Some(format!("customer{id}@example.com")),
            created_at: ts(signup),
            default_address: city.map(|name| Address {
                city: Some(name.to_string()),
                country: None,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use shopmetrics_core::{CustomerRecord, OrderRecord};

    use super::testing::{customer, order};
    use super::*;
    use crate::geocode::DisabledGeocoder;
    use crate::store::{MemoryStore, OrderWithCustomer};

    fn engine(store: MemoryStore) -> MetricsEngine {
        MetricsEngine::new(
            Arc::new(store),
            Arc::new(DisabledGeocoder),
            GeocodeSettings::default(),
        )
    }

    struct UnreachableStore;

    #[async_trait]
    impl OrderStore for UnreachableStore {
        async fn orders(&self) -> Result<Vec<OrderRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn customers(&self) -> Result<Vec<CustomerRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn orders_with_customers(&self) -> Result<Vec<OrderWithCustomer>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_sequences() {
        let engine = engine(MemoryStore::default());

        assert!(engine.total_sales(Interval::Monthly).await.unwrap().is_empty());
        assert!(engine.sales_growth_rate(Interval::Monthly).await.unwrap().is_empty());
        assert!(engine.new_customers(Interval::Monthly).await.unwrap().is_empty());
        assert!(engine.repeat_customers(Interval::Monthly).await.unwrap().is_empty());
        assert!(engine.customer_lifetime_value(Interval::Monthly).await.unwrap().is_empty());
        assert!(engine.geographical_distribution().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_total_sales_rounds_only_at_output() {
        // 0.4 + 0.4 + 0.4 = 1.2 -> 1, while rounding each order first would give 0
        let store = MemoryStore::new(
            vec![
                order(1, "2024-01-03", "0.4", None),
                order(2, "2024-01-09", "0.4", None),
                order(3, "2024-01-20", "0.4", None),
                order(4, "2024-03-01", "10.5", None),
            ],
            vec![],
        );

        let points = engine(store).total_sales(Interval::Monthly).await.unwrap();
        assert_eq!(
            points,
            vec![
                SalesPoint { bucket: "2024-01".to_string(), total_sales: 1 },
                SalesPoint { bucket: "2024-03".to_string(), total_sales: 11 },
            ]
        );
    }

    #[tokio::test]
    async fn test_growth_rate_sequence() {
        let store = MemoryStore::new(
            vec![
                order(1, "2024-01-15", "100", None),
                order(2, "2024-02-15", "150", None),
                order(3, "2024-03-15", "0", None),
                order(4, "2024-04-15", "50", None),
            ],
            vec![],
        );

        let points = engine(store).sales_growth_rate(Interval::Monthly).await.unwrap();
        let rates: Vec<Option<f64>> = points.iter().map(|p| p.growth_rate).collect();
        assert_eq!(rates, vec![Some(0.0), Some(50.0), Some(-100.0), None]);
        let totals: Vec<i64> = points.iter().map(|p| p.total_sales).collect();
        assert_eq!(totals, vec![100, 150, 0, 50]);
    }

    #[tokio::test]
    async fn test_growth_rate_rounds_to_two_places() {
        let store = MemoryStore::new(
            vec![
                order(1, "2024-01-15", "3", None),
                order(2, "2024-02-15", "4", None),
            ],
            vec![],
        );

        let points = engine(store).sales_growth_rate(Interval::Monthly).await.unwrap();
        assert_eq!(points[1].growth_rate, Some(33.33));
    }

    #[test]
    fn test_percent_conversion() {
        assert_eq!(to_percent(Decimal::new(-1_250_000, 5), "2024-02").ok(), Some(-12.5));
        assert_eq!(to_percent(Decimal::new(50_625, 3), "2024-02").ok(), Some(50.63));
        assert_eq!(to_percent(Decimal::new(-50_625, 3), "2024-02").ok(), Some(-50.62));
    }

    #[tokio::test]
    async fn test_non_numeric_amount_fails_whole_metric() {
        let store = MemoryStore::new(
            vec![
                order(1, "2024-01-15", "100", None),
                order(2, "2024-02-15", "N/A", None),
            ],
            vec![],
        );

        let result = engine(store).total_sales(Interval::Monthly).await;
        assert!(matches!(result, Err(MetricsError::Money(_))));
    }

    #[tokio::test]
    async fn test_lifetime_value_matches_joined_order_total() {
        let store = MemoryStore::new(
            vec![
                order(1, "2024-02-01", "100.25", Some(1)),
                order(2, "2024-05-01", "50.25", Some(1)),
                order(3, "2024-02-10", "20", Some(2)),
                order(4, "2024-02-10", "999", Some(404)),
                order(5, "2024-02-10", "999", None),
            ],
            vec![
                customer(1, "2024-01-20", None),
                customer(2, "2024-03-05", None),
            ],
        );

        let points = engine(store)
            .customer_lifetime_value(Interval::Quarterly)
            .await
            .unwrap();
        assert_eq!(
            points,
            vec![
                CohortValuePoint {
                    key: CohortKey { cohort: "2024-01".to_string(), date: None },
                    total_lifetime_value: 150,
                },
                CohortValuePoint {
                    key: CohortKey { cohort: "2024-03".to_string(), date: None },
                    total_lifetime_value: 20,
                },
            ]
        );
        let sum: i64 = points.iter().map(|p| p.total_lifetime_value).sum();
        assert_eq!(sum, 170);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let store = MemoryStore::new(
            vec![
                order(1, "2024-01-02", "10", Some(1)),
                order(2, "2024-01-03", "10", Some(1)),
                order(3, "2024-01-04", "10", Some(2)),
            ],
            vec![
                customer(1, "2023-12-01", Some("Oslo")),
                customer(2, "2023-12-01", Some("Bergen")),
                customer(3, "2024-01-01", Some("Oslo")),
            ],
        );
        let engine = engine(store);

        assert_eq!(
            engine.repeat_customers(Interval::Daily).await.unwrap(),
            engine.repeat_customers(Interval::Daily).await.unwrap()
        );
        assert_eq!(
            engine.geographical_distribution().await.unwrap(),
            engine.geographical_distribution().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let engine = MetricsEngine::new(
            Arc::new(UnreachableStore),
            Arc::new(DisabledGeocoder),
            GeocodeSettings::default(),
        );

        assert!(matches!(
            engine.total_sales(Interval::Monthly).await,
            Err(MetricsError::Store(_))
        ));
        assert!(matches!(
            engine.geographical_distribution().await,
            Err(MetricsError::Store(_))
        ));
    }

    #[test]
    fn test_points_serialize_with_dashboard_field_names() {
        let growth = GrowthPoint {
            bucket: "2024-Q2".to_string(),
            total_sales: 1200,
            growth_rate: None,
        };
        assert_eq!(
            serde_json::to_value(&growth).unwrap(),
            serde_json::json!({"_id": "2024-Q2", "totalSales": 1200, "growthRate": null})
        );

        let cohort = CohortValuePoint {
            key: CohortKey { cohort: "2024-01".to_string(), date: None },
            total_lifetime_value: 42,
        };
        assert_eq!(
            serde_json::to_value(&cohort).unwrap(),
            serde_json::json!({"_id": {"cohort": "2024-01", "date": null}, "totalLifetimeValue": 42})
        );

        let city = CityPoint { name: None, customer_count: 3, lat: 0.0, lng: 0.0 };
        assert_eq!(
            serde_json::to_value(&city).unwrap(),
            serde_json::json!({"name": null, "customerCount": 3, "lat": 0.0, "lng": 0.0})
        );
    }
}
