//! Spendbrief CLI - Weekly YNAB spending report
//!
//! Settings are read from the environment, after loading `./.env` (or the
//! file given with `--env-file`) when present.
//!
//! Usage:
//!   spendbrief run              Build the report and email it
//!   spendbrief run --dry-run    Print the report instead of emailing it
//!   spendbrief schedule         Email the report on its weekly schedules
//!   spendbrief windows          Show the report date windows

mod cli;
mod commands;
mod scheduler;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env before reading RUST_LOG or any other setting
    let env_file = commands::load_env_file(cli.env_file.as_deref())?;

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    if let Some(path) = env_file {
        tracing::debug!("Loaded settings from {}", path.display());
    }

    match cli.command {
        Commands::Run {
            dry_run,
            html,
            date,
        } => commands::cmd_run(date.as_deref(), dry_run, html).await,
        Commands::Schedule => commands::cmd_schedule().await,
        Commands::Windows { date } => commands::cmd_windows(date.as_deref()),
    }
}
