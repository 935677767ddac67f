//! Order and customer records as read from the store.
//!
//! The field layout follows the Shopify REST payloads so exported JSON can be
//! deserialized directly; fields the metrics never read are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CustomerId, OrderId};
use super::money::RawAmount;

/// An order snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    /// Order total including taxes; summed for cohort lifetime value.
    #[serde(default)]
    pub total_price: Option<RawAmount>,
    /// Order total in shop currency; summed for sales totals.
    #[serde(default)]
    pub total_price_set: Option<MoneySet>,
    /// Guest checkouts have no customer.
    #[serde(default)]
    pub customer: Option<OrderCustomerRef>,
}

impl OrderRecord {
    /// `total_price_set.shop_money.amount`, if present.
    #[must_use]
    pub fn shop_money_amount(&self) -> Option<&RawAmount> {
        self.total_price_set
            .as_ref()
            .and_then(|set| set.shop_money.as_ref())
            .and_then(|money| money.amount.as_ref())
    }

    /// `customer.id`, if the order is attached to a customer.
    #[must_use]
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer.as_ref().and_then(|c| c.id)
    }
}

/// Amount in the shop's and the presentment currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneySet {
    #[serde(default)]
    pub shop_money: Option<ShopMoney>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopMoney {
    #[serde(default)]
    pub amount: Option<RawAmount>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// The customer reference embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomerRef {
    #[serde(default)]
    pub id: Option<CustomerId>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A customer snapshot. `created_at` is the signup date that fixes the cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub default_address: Option<Address>,
}

impl CustomerRecord {
    /// `default_address.city`, if known.
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.default_address
            .as_ref()
            .and_then(|address| address.city.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}
