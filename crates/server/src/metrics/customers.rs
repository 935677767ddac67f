//! New and repeat customer counts.

use std::collections::{BTreeMap, HashMap};

use shopmetrics_core::{CustomerId, CustomerRecord, Interval, OrderRecord};

/// Customers per signup bucket, ascending by bucket.
#[must_use]
pub fn count_new(customers: &[CustomerRecord], interval: Interval) -> Vec<(String, u64)> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for customer in customers {
        *counts.entry(interval.bucket_key(customer.created_at)).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Customers with two or more orders in the same bucket, ascending by bucket.
///
/// Orders are first counted per `(customer, bucket)` pair; each pair with more
/// than one order then adds exactly one to its bucket. Being active in several
/// buckets is not cumulative. Guest orders have no customer and are ignored.
#[must_use]
pub fn count_repeat(orders: &[OrderRecord], interval: Interval) -> Vec<(String, u64)> {
    let mut per_customer: HashMap<(CustomerId, String), u32> = HashMap::new();
    for order in orders {
        let Some(customer_id) = order.customer_id() else {
            continue;
        };
        *per_customer
            .entry((customer_id, interval.bucket_key(order.created_at)))
            .or_default() += 1;
    }

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for ((_, bucket), orders_in_bucket) in per_customer {
        if orders_in_bucket > 1 {
            *counts.entry(bucket).or_default() += 1;
        }
    }
    counts.into_iter().collect()
}
