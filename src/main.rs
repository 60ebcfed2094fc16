//! Main entry point for the reaction-harvester CLI

use anyhow::Context;
use clap::Parser;
use reaction_harvester::cli::Cli;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    // Check if JSON output is requested via environment variable
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reaction_harvester=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(addr) = cli.metrics_addr {
        if let Err(e) = reaction_harvester::metrics::init_metrics(addr) {
            warn!("Metrics disabled: {}", e);
        }
    }

    cli.execute().await.context("harvest failed")
}

#[tokio::main]
async fn main() {
    // Token may come from a .env file; a missing file is fine
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}
