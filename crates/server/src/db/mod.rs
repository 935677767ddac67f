//! `PostgreSQL` backing for the order/customer store.
//!
//! ## Tables
//!
//! - `shop_orders` - Order snapshots (amounts kept as exported text)
//! - `shop_customers` - Customer snapshots with signup date and default city
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p shopmetrics-cli -- migrate
//! ```

pub mod customers;
pub mod orders;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use shopmetrics_core::{CustomerRecord, OrderRecord};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::store::{OrderStore, OrderWithCustomer, StoreError};

/// Embedded migrations for the store tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// [`OrderStore`] over the `shop_orders` and `shop_customers` tables.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn orders(&self) -> Result<Vec<OrderRecord>, StoreError> {
        orders::list_orders(&self.pool).await
    }

    async fn customers(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        customers::list_customers(&self.pool).await
    }

    async fn orders_with_customers(&self) -> Result<Vec<OrderWithCustomer>, StoreError> {
        orders::list_orders_with_customers(&self.pool).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
