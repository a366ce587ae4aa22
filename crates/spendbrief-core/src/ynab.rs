//! YNAB API client
//!
//! Fetches the two snapshots a report run needs: transactions since a date
//! and the category-group taxonomy with current budgeted amounts.
//!
//! # Configuration
//!
//! - `YNAB_ACCESS_TOKEN` - personal access token (required)
//! - `YNAB_BUDGET_ID` - budget to report on (required)
//! - `YNAB_API_URL` - API base URL (default: https://api.ynab.com/v1)

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{CategoryGroup, Transaction};

pub const YNAB_ACCESS_TOKEN_ENV: &str = "YNAB_ACCESS_TOKEN";
pub const YNAB_BUDGET_ID_ENV: &str = "YNAB_BUDGET_ID";
pub const YNAB_API_URL_ENV: &str = "YNAB_API_URL";

pub const DEFAULT_API_URL: &str = "https://api.ynab.com/v1";

/// Where a report run gets its data from
#[async_trait]
pub trait BudgetSource: Send + Sync {
    /// All transactions dated on or after `since`
    async fn transactions_since(&self, since: NaiveDate) -> Result<Vec<Transaction>>;

    /// Category groups with their categories, in budget order
    async fn category_groups(&self) -> Result<Vec<CategoryGroup>>;
}

/// YNAB connection settings
#[derive(Debug, Clone)]
pub struct YnabConfig {
    pub access_token: String,
    pub budget_id: String,
    pub base_url: String,
}

impl YnabConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let access_token = required_env(YNAB_ACCESS_TOKEN_ENV)?;
        let budget_id = required_env(YNAB_BUDGET_ID_ENV)?;
        let base_url = std::env::var(YNAB_API_URL_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            access_token,
            budget_id,
            base_url,
        })
    }
}

pub(crate) fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Config(format!("{} environment variable not set", name)))
}

/// HTTP client for the YNAB REST API
#[derive(Clone)]
pub struct YnabClient {
    http_client: Client,
    base_url: String,
    access_token: String,
    budget_id: String,
}

impl YnabClient {
    pub fn new(config: YnabConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token,
            budget_id: config.budget_id,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(YnabConfig::from_env()?))
    }

    fn budget_url(&self, path: &str) -> String {
        format!("{}/budgets/{}/{}", self.base_url, self.budget_id, path)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
struct CategoriesData {
    category_groups: Vec<CategoryGroup>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    name: String,
    #[serde(default)]
    detail: String,
}

/// Decode a YNAB response, mapping error bodies to `Error::Api`
async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let detail = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) if !envelope.error.detail.is_empty() => {
                format!("{}: {}", envelope.error.name, envelope.error.detail)
            }
            Ok(envelope) => envelope.error.name,
            Err(_) => body,
        };
        return Err(Error::Api {
            status: status.as_u16(),
            detail,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl BudgetSource for YnabClient {
    async fn transactions_since(&self, since: NaiveDate) -> Result<Vec<Transaction>> {
        let since_date = since.format("%Y-%m-%d").to_string();
        let response = self
            .http_client
            .get(self.budget_url("transactions"))
            .bearer_auth(&self.access_token)
            .query(&[("since_date", since_date.as_str())])
            .send()
            .await?;

        let envelope: Envelope<TransactionsData> = decode(response).await?;
        debug!(
            since = %since_date,
            count = envelope.data.transactions.len(),
            "Fetched transactions"
        );
        Ok(envelope.data.transactions)
    }

    async fn category_groups(&self) -> Result<Vec<CategoryGroup>> {
        let response = self
            .http_client
            .get(self.budget_url("categories"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let envelope: Envelope<CategoriesData> = decode(response).await?;
        debug!(
            count = envelope.data.category_groups.len(),
            "Fetched category groups"
        );
        Ok(envelope.data.category_groups)
    }
}
