//! Error types for Spendbrief

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YNAB API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Schedule error: {0}")]
    Schedule(String),

    #[error("Mail error: {0}")]
    Mail(String),
}

pub type Result<T> = std::result::Result<T, Error>;
