//! Core types for shopmetrics.
//!
//! This module provides type-safe wrappers for the analytics domain.

pub mod id;
pub mod interval;
pub mod money;
pub mod record;

pub use id::*;
pub use interval::{Interval, bucket_key};
pub use money::{MoneyError, RawAmount, parse_amount, round_half_even, round_percent, round_to_unit};
pub use record::{Address, CustomerRecord, MoneySet, OrderCustomerRef, OrderRecord, ShopMoney};
