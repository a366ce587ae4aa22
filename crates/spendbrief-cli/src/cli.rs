//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spendbrief - Weekly YNAB spending report by email
#[derive(Parser)]
#[command(name = "spendbrief")]
#[command(about = "Weekly spending report for a YNAB budget", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Load settings from this file instead of `./.env`
    ///
    /// Variables already set in the environment take precedence.
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the report now and email it
    Run {
        /// Print the report instead of emailing it
        #[arg(long)]
        dry_run: bool,

        /// Print the HTML body instead of plain text (with --dry-run)
        #[arg(long, requires = "dry_run")]
        html: bool,

        /// Report as if today were this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Run the report on its weekly schedules until interrupted
    ///
    /// Schedules come from SPENDBRIEF_SCHEDULES (`;`-separated cron
    /// expressions, default "0 10 * * 1").
    Schedule,

    /// Show the date windows a report would cover
    Windows {
        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}
