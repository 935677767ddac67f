//! Shopmetrics Core - Shared types library.
//!
//! This crate provides the types used across all shopmetrics components:
//! - `server` - JSON analytics API over the order/customer store
//! - `cli` - Command-line tools for migrations, imports and offline reports
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Bucketing a timestamp or parsing an amount never
//! touches the network, so both can be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, time-bucket intervals, money parsing and the
//!   order/customer records the metrics are computed from

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
