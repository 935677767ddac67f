//! Analytics route handlers.
//!
//! Each handler maps one dashboard chart to a [`MetricsEngine`] call and
//! returns its rows as a JSON array. Failures become an opaque 500 through
//! [`AppError`].
//!
//! [`MetricsEngine`]: crate::metrics::MetricsEngine

use axum::{
    Json,
    extract::{Query, State},
};
use shopmetrics_core::Interval;
use tracing::instrument;

use crate::error::AppError;
use crate::metrics::{
    CityPoint, CohortValuePoint, GrowthPoint, NewCustomersPoint, RepeatCustomersPoint, SalesPoint,
};
use crate::state::AppState;

// =============================================================================
// Query Parameters
// =============================================================================

/// `?interval=` selector shared by the bucketed charts.
///
/// Built from the raw query pairs so a malformed or repeated parameter never
/// rejects the request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IntervalQuery {
    /// Every `interval` value in the query string, in order.
    values: Vec<String>,
}

impl IntervalQuery {
    /// Collect the `interval` values from decoded query pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .filter(|(key, _)| key == "interval")
                .map(|(_, value)| value)
                .collect(),
        }
    }

    /// Resolve the requested interval.
    ///
    /// Missing or empty selects monthly. An unrecognized or repeated value
    /// falls back to daily, matching what existing dashboards rely on.
    fn interval(&self) -> Interval {
        match self.values.as_slice() {
            [] => Interval::from_query(None),
            [name] => {
                if !name.is_empty() && Interval::from_name(name).is_none() {
                    tracing::debug!(interval = %name, "unrecognized interval, using daily buckets");
                }
                Interval::from_query(Some(name.as_str()))
            }
            repeated => {
                tracing::debug!(interval = ?repeated, "repeated interval, using daily buckets");
                Interval::Daily
            }
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/analytics/total-sales`
#[instrument(skip(state))]
pub async fn total_sales(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<SalesPoint>>, AppError> {
    Ok(Json(state.engine().total_sales(IntervalQuery::from_pairs(pairs).interval()).await?))
}

/// `GET /api/analytics/sales-growth-rate`
#[instrument(skip(state))]
pub async fn sales_growth_rate(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<GrowthPoint>>, AppError> {
    Ok(Json(state.engine().sales_growth_rate(IntervalQuery::from_pairs(pairs).interval()).await?))
}

/// `GET /api/analytics/new-customers`
#[instrument(skip(state))]
pub async fn new_customers(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<NewCustomersPoint>>, AppError> {
    Ok(Json(state.engine().new_customers(IntervalQuery::from_pairs(pairs).interval()).await?))
}

/// `GET /api/analytics/repeat-customers`
#[instrument(skip(state))]
pub async fn repeat_customers(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<RepeatCustomersPoint>>, AppError> {
    Ok(Json(state.engine().repeat_customers(IntervalQuery::from_pairs(pairs).interval()).await?))
}

/// `GET /api/analytics/customer-lifetime-value`
#[instrument(skip(state))]
pub async fn customer_lifetime_value(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<CohortValuePoint>>, AppError> {
    Ok(Json(
        state
            .engine()
            .customer_lifetime_value(IntervalQuery::from_pairs(pairs).interval())
            .await?,
    ))
}

/// `GET /api/analytics/geographical-distribution`
#[instrument(skip(state))]
pub async fn geographical_distribution(
    State(state): State<AppState>,
) -> Result<Json<Vec<CityPoint>>, AppError> {
    Ok(Json(state.engine().geographical_distribution().await?))
}
