//! Test utilities for spendbrief-core
//!
//! Provides a mock YNAB API server plus in-memory `BudgetSource` and
//! `Mailer` implementations for integration tests and CLI tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::json;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::mail::{Mailer, ReportEmail};
use crate::models::{CategoryGroup, Transaction};
use crate::ynab::{BudgetSource, YnabConfig};

/// Data served by [`MockYnabServer`]
#[derive(Debug, Clone)]
pub struct YnabFixture {
    pub budget_id: String,
    pub access_token: String,
    pub groups: Vec<CategoryGroup>,
    pub transactions: Vec<Transaction>,
    /// When set, every request fails with this status
    pub fail_with: Option<u16>,
}

impl YnabFixture {
    pub fn new(groups: Vec<CategoryGroup>, transactions: Vec<Transaction>) -> Self {
        Self {
            budget_id: "test-budget".to_string(),
            access_token: "test-token".to_string(),
            groups,
            transactions,
            fail_with: None,
        }
    }

    pub fn failing(mut self, status: u16) -> Self {
        self.fail_with = Some(status);
        self
    }
}

#[derive(Clone)]
struct MockState {
    fixture: Arc<YnabFixture>,
    since_dates: Arc<Mutex<Vec<String>>>,
}

/// Mock YNAB API server for testing
pub struct MockYnabServer {
    addr: SocketAddr,
    budget_id: String,
    access_token: String,
    since_dates: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockYnabServer {
    /// Start the mock server on an available port
    pub async fn start(fixture: YnabFixture) -> Self {
        let budget_id = fixture.budget_id.clone();
        let access_token = fixture.access_token.clone();
        let since_dates = Arc::new(Mutex::new(Vec::new()));

        let state = MockState {
            fixture: Arc::new(fixture),
            since_dates: since_dates.clone(),
        };

        let app = Router::new()
            .route("/v1/budgets/:budget_id/transactions", get(handle_transactions))
            .route("/v1/budgets/:budget_id/categories", get(handle_categories))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            budget_id,
            access_token,
            since_dates,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the API base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Client configuration pointing at this server
    pub fn config(&self) -> YnabConfig {
        YnabConfig {
            access_token: self.access_token.clone(),
            budget_id: self.budget_id.clone(),
            base_url: self.url(),
        }
    }

    /// `since_date` values received so far, in order
    pub fn since_dates(&self) -> Vec<String> {
        self.since_dates.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockYnabServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn error_response(status: StatusCode, name: &str, detail: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {"id": status.as_u16().to_string(), "name": name, "detail": detail}
        })),
    )
        .into_response()
}

/// Reject requests for another budget, a bad token or a forced failure
fn check_request(state: &MockState, budget_id: &str, headers: &HeaderMap) -> Option<Response> {
    if let Some(status) = state.fixture.fail_with {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Some(error_response(status, "mock_failure", "Forced failure"));
    }

    let expected = format!("Bearer {}", state.fixture.access_token);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return Some(error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Unauthorized",
        ));
    }

    if budget_id != state.fixture.budget_id {
        return Some(error_response(
            StatusCode::NOT_FOUND,
            "resource_not_found",
            "Budget not found",
        ));
    }

    None
}

/// GET /v1/budgets/{budget_id}/transactions?since_date=YYYY-MM-DD
async fn handle_transactions(
    State(state): State<MockState>,
    Path(budget_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = check_request(&state, &budget_id, &headers) {
        return rejection;
    }

    let since = params.get("since_date").cloned();
    if let Some(since) = &since {
        state.since_dates.lock().unwrap().push(since.clone());
    }

    let since = since.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok());
    let transactions: Vec<&Transaction> = state
        .fixture
        .transactions
        .iter()
        .filter(|t| since.map_or(true, |since| t.date >= since))
        .collect();

    Json(json!({
        "data": {"transactions": transactions, "server_knowledge": 1}
    }))
    .into_response()
}

/// GET /v1/budgets/{budget_id}/categories
async fn handle_categories(
    State(state): State<MockState>,
    Path(budget_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = check_request(&state, &budget_id, &headers) {
        return rejection;
    }

    Json(json!({
        "data": {"category_groups": state.fixture.groups, "server_knowledge": 1}
    }))
    .into_response()
}

/// In-memory `BudgetSource`
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub groups: Vec<CategoryGroup>,
    pub transactions: Vec<Transaction>,
}

impl StaticSource {
    pub fn new(groups: Vec<CategoryGroup>, transactions: Vec<Transaction>) -> Self {
        Self {
            groups,
            transactions,
        }
    }
}

#[async_trait]
impl BudgetSource for StaticSource {
    async fn transactions_since(&self, since: NaiveDate) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .iter()
            .filter(|t| t.date >= since)
            .cloned()
            .collect())
    }

    async fn category_groups(&self) -> Result<Vec<CategoryGroup>> {
        Ok(self.groups.clone())
    }
}

/// `Mailer` that keeps every email instead of sending it
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<ReportEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<ReportEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &ReportEmail) -> Result<()> {
        if self.fail {
            return Err(Error::Mail("Recording mailer configured to fail".into()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
