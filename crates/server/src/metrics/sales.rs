//! Sales totals and growth rate.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use shopmetrics_core::{Interval, MoneyError, OrderRecord};

use super::MetricsError;

/// Unrounded sales total of one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTotal {
    pub bucket: String,
    pub amount: Decimal,
}

/// A bucket total with its growth against the preceding present bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrowthRow {
    pub bucket: String,
    pub total: Decimal,
    /// Unrounded percentage; `None` when the previous total is zero.
    pub growth_rate: Option<Decimal>,
}

/// Sum `total_price_set.shop_money.amount` per bucket, ascending by bucket.
///
/// An order without an amount still opens its bucket but adds nothing to it.
///
/// # Errors
///
/// Returns [`MoneyError`] for the first amount that is not numeric.
pub fn bucket_totals(
    orders: &[OrderRecord],
    interval: Interval,
) -> Result<Vec<BucketTotal>, MoneyError> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();

    for order in orders {
        let total = totals.entry(interval.bucket_key(order.created_at)).or_default();
        if let Some(amount) = order.shop_money_amount() {
            *total += amount.parse()?;
        }
    }

    Ok(totals
        .into_iter()
        .map(|(bucket, amount)| BucketTotal { bucket, amount })
        .collect())
}

/// Percentage change of each bucket against the one before it in `totals`.
///
/// `totals` must be sorted by bucket. Gaps in calendar time are not filled:
/// the previous bucket is whichever one precedes in the sequence. The first
/// bucket gets a rate of zero.
///
/// # Errors
///
/// Returns [`MetricsError::Overflow`] if the arithmetic leaves the decimal range.
pub fn growth_rates(totals: &[BucketTotal]) -> Result<Vec<GrowthRow>, MetricsError> {
    let hundred = Decimal::ONE_HUNDRED;
    let mut previous: Option<Decimal> = None;
    let mut rows = Vec::with_capacity(totals.len());

    for BucketTotal { bucket, amount } in totals {
        let growth_rate = match previous {
            None => Some(Decimal::ZERO),
            Some(prev) if prev.is_zero() => None,
            Some(prev) => Some(
                amount
                    .checked_sub(prev)
                    .and_then(|delta| delta.checked_div(prev))
                    .and_then(|ratio| ratio.checked_mul(hundred))
                    .ok_or_else(|| MetricsError::Overflow(format!("growth rate for {bucket}")))?,
            ),
        };

        rows.push(GrowthRow {
            bucket: bucket.clone(),
            total: *amount,
            growth_rate,
        });
        previous = Some(*amount);
    }

    Ok(rows)
}
