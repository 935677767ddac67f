//! Import Shopify exports into the analytics tables.
//!
//! # Usage
//!
//! ```bash
//! shopmetrics import --orders orders.json --customers customers.json
//! ```
//!
//! Records are upserted by id, so re-importing a newer export replaces the
//! old snapshot rows. Customers are written first.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use std::path::Path;

use secrecy::SecretString;
use shopmetrics_core::{CustomerRecord, OrderRecord};
use shopmetrics_server::db;
use shopmetrics_server::store::StoreError;
use thiserror::Error;

use super::export::{self, ExportError};

/// Errors that can occur during import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Nothing to import: pass --orders and/or --customers")]
    NothingToImport,

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Load the given exports and upsert them.
///
/// # Errors
///
/// Returns an error if no file is given, a file cannot be parsed, or the
/// database write fails.
pub async fn run(orders: Option<&Path>, customers: Option<&Path>) -> Result<(), ImportError> {
    if orders.is_none() && customers.is_none() {
        return Err(ImportError::NothingToImport);
    }
    dotenvy::dotenv().ok();

    // Parse everything before touching the database
    let customers: Vec<CustomerRecord> = export::load_optional(customers, "customers")?;
    let orders: Vec<OrderRecord> = export::load_optional(orders, "orders")?;

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| ImportError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    if !customers.is_empty() {
        let written = db::customers::upsert_customers(&pool, &customers).await?;
        tracing::info!(read = customers.len(), written, "Customers imported");
    }

    if !orders.is_empty() {
        let guests = orders.iter().filter(|o| o.customer_id().is_none()).count();
        let written = db::orders::upsert_orders(&pool, &orders).await?;
        tracing::info!(read = orders.len(), written, guests, "Orders imported");
    }

    Ok(())
}
