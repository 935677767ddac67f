//! CLI subcommands.

pub mod export;
pub mod import;
pub mod migrate;
pub mod report;
