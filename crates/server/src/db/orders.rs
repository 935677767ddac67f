//! Order table operations.

use chrono::{DateTime, Utc};
use shopmetrics_core::{
    CustomerId, MoneySet, OrderCustomerRef, OrderId, OrderRecord, RawAmount, ShopMoney,
};
use sqlx::PgPool;

use super::customers::CustomerRow;
use crate::store::{OrderWithCustomer, StoreError};

/// A row of `shop_orders`.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    created_at: DateTime<Utc>,
    total_price: Option<String>,
    shop_money_amount: Option<String>,
    shop_currency_code: Option<String>,
    customer_id: Option<i64>,
    customer_email: Option<String>,
}

impl From<OrderRow> for OrderRecord {
    fn from(row: OrderRow) -> Self {
        let total_price_set = (row.shop_money_amount.is_some() || row.shop_currency_code.is_some())
            .then(|| MoneySet {
                shop_money: Some(ShopMoney {
                    amount: row.shop_money_amount.map(RawAmount::new),
                    currency_code: row.shop_currency_code,
                }),
            });
        let customer = row.customer_id.map(|id| OrderCustomerRef {
            id: Some(CustomerId::new(id)),
            email: row.customer_email,
        });

        Self {
            id: OrderId::new(row.id),
            created_at: row.created_at,
            total_price: row.total_price.map(RawAmount::new),
            total_price_set,
            customer,
        }
    }
}

/// Joined order and customer columns; customer columns are prefixed `c_`.
#[derive(Debug, sqlx::FromRow)]
struct OrderCustomerRow {
    #[sqlx(flatten)]
    order: OrderRow,
    c_id: i64,
    c_email: Option<String>,
    c_created_at: DateTime<Utc>,
    c_city: Option<String>,
    c_country: Option<String>,
}

impl From<OrderCustomerRow> for OrderWithCustomer {
    fn from(row: OrderCustomerRow) -> Self {
        let customer = CustomerRow {
            id: row.c_id,
            email: row.c_email,
            created_at: row.c_created_at,
            city: row.c_city,
            country: row.c_country,
        };

        Self {
            order: row.order.into(),
            customer: customer.into(),
        }
    }
}

/// Fetch every order.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list_orders(pool: &PgPool) -> Result<Vec<OrderRecord>, StoreError> {
    let rows = sqlx::query_as::<_, OrderRow>(
        r"
        SELECT id, created_at, total_price, shop_money_amount, shop_currency_code,
               customer_id, customer_email
        FROM shop_orders
        ",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(OrderRecord::from).collect())
}

/// Fetch orders joined to their customer (inner join on customer id).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list_orders_with_customers(
    pool: &PgPool,
) -> Result<Vec<OrderWithCustomer>, StoreError> {
    let rows = sqlx::query_as::<_, OrderCustomerRow>(
        r"
        SELECT o.id, o.created_at, o.total_price, o.shop_money_amount, o.shop_currency_code,
               o.customer_id, o.customer_email,
               c.id AS c_id, c.email AS c_email, c.created_at AS c_created_at,
               c.city AS c_city, c.country AS c_country
        FROM shop_orders o
        INNER JOIN shop_customers c ON c.id = o.customer_id
        ",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(OrderWithCustomer::from).collect())
}

/// Insert or replace orders by id.
///
/// Runs in a single transaction and returns the number of rows written.
///
/// # Errors
///
/// Returns an error if any statement fails; nothing is written in that case.
pub async fn upsert_orders(pool: &PgPool, orders: &[OrderRecord]) -> Result<u64, StoreError> {
    let mut tx = pool.begin().await?;
    let mut written = 0;

    for order in orders {
        let currency = order
            .total_price_set
            .as_ref()
            .and_then(|set| set.shop_money.as_ref())
            .and_then(|money| money.currency_code.as_deref());
        let customer_email = order.customer.as_ref().and_then(|c| c.email.as_deref());

        let result = sqlx::query(
            r"
            INSERT INTO shop_orders
                (id, created_at, total_price, shop_money_amount, shop_currency_code,
                 customer_id, customer_email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                created_at = EXCLUDED.created_at,
                total_price = EXCLUDED.total_price,
                shop_money_amount = EXCLUDED.shop_money_amount,
                shop_currency_code = EXCLUDED.shop_currency_code,
                customer_id = EXCLUDED.customer_id,
                customer_email = EXCLUDED.customer_email,
                imported_at = NOW()
            ",
        )
        .bind(order.id)
        .bind(order.created_at)
        .bind(order.total_price.as_ref().map(RawAmount::as_str))
        .bind(order.shop_money_amount().map(RawAmount::as_str))
        .bind(currency)
        .bind(order.customer_id())
        .bind(customer_email)
        .execute(&mut *tx)
        .await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}
