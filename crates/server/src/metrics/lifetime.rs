//! Customer lifetime value rolled up to signup cohorts.
//!
//! Two grouping passes, kept apart on purpose:
//!
//! 1. per customer: sum `total_price` of the customer's orders and tag the
//!    result with the cohort, the customer's signup month;
//! 2. per cohort: sum those customer values.
//!
//! The cohort always comes from the signup date, never from when an order was
//! placed.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use shopmetrics_core::{CustomerId, Interval, MoneyError};

use crate::store::OrderWithCustomer;

/// Cohorts are monthly regardless of the requested interval.
pub const COHORT_INTERVAL: Interval = Interval::Monthly;

/// Lifetime value of one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerLifetime {
    pub customer_id: CustomerId,
    pub cohort: String,
    pub lifetime_value: Decimal,
}

/// Summed lifetime value of one cohort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortTotal {
    pub cohort: String,
    pub total: Decimal,
}

/// First pass: lifetime value per customer.
///
/// Orders without a `total_price` contribute nothing.
///
/// # Errors
///
/// Returns [`MoneyError`] for the first order total that is not numeric.
pub fn customer_lifetimes(joined: &[OrderWithCustomer]) -> Result<Vec<CustomerLifetime>, MoneyError> {
    let mut by_customer: HashMap<(CustomerId, String), Decimal> = HashMap::new();

    for OrderWithCustomer { order, customer } in joined {
        let cohort = COHORT_INTERVAL.bucket_key(customer.created_at);
        let value = by_customer.entry((customer.id, cohort)).or_default();
        if let Some(price) = &order.total_price {
            *value += price.parse()?;
        }
    }

    let mut lifetimes: Vec<CustomerLifetime> = by_customer
        .into_iter()
        .map(|((customer_id, cohort), lifetime_value)| CustomerLifetime {
            customer_id,
            cohort,
            lifetime_value,
        })
        .collect();
    lifetimes.sort_by(|a, b| (&a.cohort, a.customer_id).cmp(&(&b.cohort, b.customer_id)));

    Ok(lifetimes)
}

/// Second pass: total lifetime value per cohort, ascending by cohort.
#[must_use]
pub fn cohort_values(lifetimes: &[CustomerLifetime]) -> Vec<CohortTotal> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for lifetime in lifetimes {
        *totals.entry(lifetime.cohort.as_str()).or_default() += lifetime.lifetime_value;
    }

    totals
        .into_iter()
        .map(|(cohort, total)| CohortTotal {
            cohort: cohort.to_string(),
            total,
        })
        .collect()
}

/// Average shown on the dashboard: the mean of cohort totals.
///
/// Divides by the number of cohorts, not customers. `None` when there are no
/// cohorts.
#[must_use]
pub fn cohort_average(cohorts: &[CohortTotal]) -> Option<Decimal> {
    if cohorts.is_empty() {
        return None;
    }
    let sum: Decimal = cohorts.iter().map(|c| c.total).sum();
    sum.checked_div(Decimal::from(cohorts.len()))
}
