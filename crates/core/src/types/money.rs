//! Monetary amounts using decimal arithmetic.
//!
//! Shopify exports carry prices as strings (`"19.99"`), older exports and
//! hand-built fixtures sometimes as numbers. [`RawAmount`] keeps whatever
//! arrived as text; [`parse_amount`] turns it into a [`Decimal`] at the point
//! of summation. Sums stay unrounded and only the output boundary rounds.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a monetary amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The value is not a decimal number.
    #[error("amount is not numeric: {0:?}")]
    NotNumeric(String),
}

/// Parse a decimal amount from its textual form.
///
/// Surrounding whitespace is ignored and scientific notation is accepted.
///
/// ```
/// use rust_decimal::Decimal;
/// use shopmetrics_core::parse_amount;
///
/// assert_eq!(parse_amount("19.99").unwrap(), Decimal::new(1999, 2));
/// assert_eq!(parse_amount(" 5 ").unwrap(), Decimal::new(5, 0));
/// assert_eq!(parse_amount("1.5e2").unwrap(), Decimal::new(150, 0));
/// assert!(parse_amount("n/a").is_err());
/// ```
///
/// # Errors
///
/// Returns [`MoneyError::NotNumeric`] if the value cannot be read as a decimal.
pub fn parse_amount(raw: &str) -> Result<Decimal, MoneyError> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| MoneyError::NotNumeric(raw.to_string()))
}

/// Round to a whole currency unit, halves toward positive infinity.
///
/// `2.5` becomes `3` and `-2.5` becomes `-2`, the same as `Math.round` on the
/// dashboard side.
#[must_use]
pub fn round_to_unit(amount: Decimal) -> Decimal {
    round_half_up(amount, 0)
}

/// Round to a whole currency unit, halves to the nearest even unit.
#[must_use]
pub fn round_half_even(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Round a percentage to two decimal places, halves toward positive infinity.
#[must_use]
pub fn round_percent(percent: Decimal) -> Decimal {
    round_half_up(percent, 2)
}

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let strategy = if value.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    value.round_dp_with_strategy(dp, strategy)
}

/// An amount exactly as it arrived from the store, not yet parsed.
///
/// Deserializes from a JSON string or a JSON number and serializes back as a
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawAmount(String);

impl RawAmount {
    /// Wrap raw text.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a decimal.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::NotNumeric`] if the raw text is not a number.
    pub fn parse(&self) -> Result<Decimal, MoneyError> {
        parse_amount(&self.0)
    }
}

impl From<&str> for RawAmount {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Decimal> for RawAmount {
    fn from(amount: Decimal) -> Self {
        Self(amount.to_string())
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RawAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawAmountVisitor)
    }
}

struct RawAmountVisitor;

impl Visitor<'_> for RawAmountVisitor {
    type Value = RawAmount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a monetary amount as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(RawAmount::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(RawAmount(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(RawAmount(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(RawAmount(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(RawAmount(v.to_string()))
    }
}
