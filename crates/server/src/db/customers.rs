//! Customer table operations.

use chrono::{DateTime, Utc};
use shopmetrics_core::{Address, CustomerId, CustomerRecord};
use sqlx::PgPool;

use crate::store::StoreError;

/// A row of `shop_customers`.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CustomerRow {
    pub id: i64,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl From<CustomerRow> for CustomerRecord {
    fn from(row: CustomerRow) -> Self {
        let default_address = (row.city.is_some() || row.country.is_some()).then(|| Address {
            city: row.city,
            country: row.country,
        });

        Self {
            id: CustomerId::new(row.id),
            email: row.email,
            created_at: row.created_at,
            default_address,
        }
    }
}

/// Fetch every customer.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list_customers(pool: &PgPool) -> Result<Vec<CustomerRecord>, StoreError> {
    let rows = sqlx::query_as::<_, CustomerRow>(
        r"
        SELECT id, email, created_at, city, country
        FROM shop_customers
        ",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CustomerRecord::from).collect())
}

/// Insert or replace customers by id.
///
/// Runs in a single transaction and returns the number of rows written.
///
/// # Errors
///
/// Returns an error if any statement fails; nothing is written in that case.
pub async fn upsert_customers(
    pool: &PgPool,
    customers: &[CustomerRecord],
) -> Result<u64, StoreError> {
    let mut tx = pool.begin().await?;
    let mut written = 0;

    for customer in customers {
        let address = customer.default_address.as_ref();
        let result = sqlx::query(
            r"
            INSERT INTO shop_customers (id, email, created_at, city, country)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                created_at = EXCLUDED.created_at,
                city = EXCLUDED.city,
                country = EXCLUDED.country,
                imported_at = NOW()
            ",
        )
        .bind(customer.id)
        .bind(customer.email.as_deref())
        .bind(customer.created_at)
        .bind(address.and_then(|a| a.city.as_deref()))
        .bind(address.and_then(|a| a.country.as_deref()))
        .execute(&mut *tx)
        .await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}
