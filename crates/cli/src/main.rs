//! Shopmetrics CLI - migrations, data import and offline reports.
//!
//! # Usage
//!
//! ```bash
//! # Create the order/customer tables
//! shopmetrics migrate
//!
//! # Load Shopify exports into the database
//! shopmetrics import --orders orders.json --customers customers.json
//!
//! # Compute a metric straight from exports, no database needed
//! shopmetrics report total-sales --interval quarterly --orders orders.json --customers customers.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `import` - Upsert orders and customers from JSON exports
//! - `report` - Print one metric as JSON

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::report::Metric;

#[derive(Parser)]
#[command(name = "shopmetrics")]
#[command(author, version, about = "Shopmetrics CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Import orders and customers from Shopify JSON exports
    Import {
        /// Orders export (array or `{"orders": [...]}`)
        #[arg(long)]
        orders: Option<PathBuf>,

        /// Customers export (array or `{"customers": [...]}`)
        #[arg(long)]
        customers: Option<PathBuf>,
    },
    /// Compute one metric from exports and print it as JSON
    Report {
        /// Metric to compute
        #[arg(value_enum)]
        metric: Metric,

        /// Bucket granularity (`daily`, `monthly`, `quarterly`, `yearly`)
        #[arg(short, long)]
        interval: Option<String>,

        /// Orders export
        #[arg(long)]
        orders: Option<PathBuf>,

        /// Customers export
        #[arg(long)]
        customers: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing (stderr, so report output stays clean JSON)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopmetrics=info,shopmetrics_server=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Import { orders, customers } => {
            commands::import::run(orders.as_deref(), customers.as_deref()).await?;
        }
        Commands::Report {
            metric,
            interval,
            orders,
            customers,
        } => {
            commands::report::run(
                metric,
                interval.as_deref(),
                orders.as_deref(),
                customers.as_deref(),
            )
            .await?;
        }
    }
    Ok(())
}
