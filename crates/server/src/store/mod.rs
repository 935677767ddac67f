//! Read access to the order/customer store.
//!
//! The metrics engine only ever reads; each metric request issues a single
//! call on [`OrderStore`] and computes everything else in memory. Two
//! implementations exist:
//!
//! - [`crate::db::PgStore`] - `PostgreSQL` tables populated by `shopmetrics import`
//! - [`MemoryStore`] - in-memory snapshots for tests and offline reports

pub mod memory;

use async_trait::async_trait;
use shopmetrics_core::{CustomerRecord, OrderRecord};
use thiserror::Error;

pub use memory::MemoryStore;

/// Errors that can occur while reading from the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store did not answer in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// An order joined to the customer it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWithCustomer {
    pub order: OrderRecord,
    pub customer: CustomerRecord,
}

/// Read-only snapshot access to orders and customers.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// All orders.
    async fn orders(&self) -> Result<Vec<OrderRecord>, StoreError>;

    /// All customers.
    async fn customers(&self) -> Result<Vec<CustomerRecord>, StoreError>;

    /// Orders joined to their customer by customer id.
    ///
    /// Inner join: orders without a customer, or whose customer id has no
    /// matching customer record, are not returned.
    async fn orders_with_customers(&self) -> Result<Vec<OrderWithCustomer>, StoreError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;
}
