//! In-memory store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shopmetrics_core::{CustomerId, CustomerRecord, OrderRecord};

use super::{OrderStore, OrderWithCustomer, StoreError};

/// Immutable snapshot of orders and customers held in memory.
///
/// Cloning shares the snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    orders: Vec<OrderRecord>,
    customers: Vec<CustomerRecord>,
}

impl MemoryStore {
    /// Create a store from record snapshots.
    #[must_use]
    pub fn new(orders: Vec<OrderRecord>, customers: Vec<CustomerRecord>) -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner { orders, customers }),
        }
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn orders(&self) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(self.inner.orders.clone())
    }

    async fn customers(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        Ok(self.inner.customers.clone())
    }

    async fn orders_with_customers(&self) -> Result<Vec<OrderWithCustomer>, StoreError> {
        let by_id: HashMap<CustomerId, &CustomerRecord> = self
            .inner
            .customers
            .iter()
            .map(|customer| (customer.id, customer))
            .collect();

        Ok(self
            .inner
            .orders
            .iter()
            .filter_map(|order| {
                let customer = by_id.get(&order.customer_id()?)?;
                Some(OrderWithCustomer {
                    order: order.clone(),
                    customer: (*customer).clone(),
                })
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
