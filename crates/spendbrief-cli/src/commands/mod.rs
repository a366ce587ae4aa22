//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `run` - One report run (send or dry run) and runner construction
//! - `schedule` - Long-running scheduled delivery
//! - `windows` - Date window inspection

pub mod run;
pub mod schedule;
pub mod windows;

// Re-export command functions for main.rs
pub use run::*;
pub use schedule::*;
pub use windows::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

/// Load a `.env` file into the process environment
///
/// With no explicit path, a missing `.env` is not an error. Returns the file
/// that was loaded, if any. Existing variables are never overwritten.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        None => Ok(dotenvy::dotenv().ok()),
    }
}

/// Parse a `--date` argument, defaulting to today's local date
pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .context("Invalid --date format (use YYYY-MM-DD)"),
        None => Ok(Local::now().date_naive()),
    }
}
