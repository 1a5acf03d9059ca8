//! # Equipment Rentals Main Entry Point
//!
//! This is the main entry point for the rentals API service.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rentals::{config::ConfigLoader, db, seeds, server::run_server, telemetry};

#[derive(Parser, Debug)]
#[command(name = "rentals")]
#[command(about = "Equipment rental catalog and booking service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply migrations and serve the HTTP API (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;

    telemetry::init_tracing(&config).context("Failed to initialize telemetry")?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config).await?;
    db::run_migrations(&db).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            tracing::info!("Migrations complete");
            Ok(())
        }
        Command::Serve => {
            if config.seed_demo_catalog {
                seeds::seed_demo_catalog(&db).await?;
            }
            run_server(config, db).await
        }
    }
}
