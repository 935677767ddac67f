//! Offline metric reports.
//!
//! # Usage
//!
//! ```bash
//! shopmetrics report repeat-customers --interval monthly \
//!     --orders orders.json --customers customers.json
//! ```
//!
//! Runs the same computation as the HTTP API against an in-memory snapshot
//! of the exports and prints the rows as pretty JSON on stdout. Coordinate
//! lookups are disabled, so cities report `(0, 0)`.

use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::Serialize;
use shopmetrics_core::{CustomerRecord, Interval, OrderRecord};
use shopmetrics_server::geocode::DisabledGeocoder;
use shopmetrics_server::metrics::lifetime::{self, CohortTotal};
use shopmetrics_server::metrics::{
    CohortValuePoint, GeocodeSettings, MetricsEngine, MetricsError,
};
use shopmetrics_server::store::MemoryStore;
use thiserror::Error;

use super::export::{self, ExportError};

/// Metrics the report command can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    TotalSales,
    SalesGrowthRate,
    NewCustomers,
    RepeatCustomers,
    CustomerLifetimeValue,
    GeographicalDistribution,
}

/// Errors that can occur while reporting.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Metric failed: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Compute `metric` from the exports and print it.
///
/// # Errors
///
/// Returns an error if an export cannot be loaded or the metric fails.
pub async fn run(
    metric: Metric,
    interval: Option<&str>,
    orders: Option<&Path>,
    customers: Option<&Path>,
) -> Result<(), ReportError> {
    let orders: Vec<OrderRecord> = export::load_optional(orders, "orders")?;
    let customers: Vec<CustomerRecord> = export::load_optional(customers, "customers")?;
    tracing::info!(orders = orders.len(), customers = customers.len(), "Loaded exports");

    let json = render(metric, Interval::from_query(interval), orders, customers).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}

/// Compute one metric over a snapshot and encode it as pretty JSON.
async fn render(
    metric: Metric,
    interval: Interval,
    orders: Vec<OrderRecord>,
    customers: Vec<CustomerRecord>,
) -> Result<String, ReportError> {
    let engine = MetricsEngine::new(
        Arc::new(MemoryStore::new(orders, customers)),
        Arc::new(DisabledGeocoder),
        GeocodeSettings::default(),
    );

    match metric {
        Metric::TotalSales => pretty(&engine.total_sales(interval).await?),
        Metric::SalesGrowthRate => pretty(&engine.sales_growth_rate(interval).await?),
        Metric::NewCustomers => pretty(&engine.new_customers(interval).await?),
        Metric::RepeatCustomers => pretty(&engine.repeat_customers(interval).await?),
        Metric::CustomerLifetimeValue => {
            let rows = engine.customer_lifetime_value(interval).await?;
            if let Some(average) = dashboard_average(&rows) {
                tracing::info!(cohorts = rows.len(), %average, "Average lifetime value per cohort");
            }
            pretty(&rows)
        }
        Metric::GeographicalDistribution => pretty(&engine.geographical_distribution().await?),
    }
}

/// The average the dashboard shows next to the cohort chart.
fn dashboard_average(rows: &[CohortValuePoint]) -> Option<Decimal> {
    let cohorts: Vec<CohortTotal> = rows
        .iter()
        .map(|row| CohortTotal {
            cohort: row.key.cohort.clone(),
            total: Decimal::from(row.total_lifetime_value),
        })
        .collect();
    lifetime::cohort_average(&cohorts).map(|avg| avg.round_dp(2))
}

fn pretty<T: Serialize>(rows: &T) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(rows)?)
}
