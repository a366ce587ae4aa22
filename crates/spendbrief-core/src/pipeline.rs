//! One report run, end to end
//!
//! Fetch -> windows -> aggregate -> render -> deliver, strictly in that
//! order. Any failure aborts the run before anything is sent; there is no
//! retry and no partial report.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::{compute_report, EngineConfig, GroupReport};
use crate::error::{Error, Result};
use crate::mail::{Mailer, ReportEmail, DEFAULT_SUBJECT};
use crate::render::{render_html, render_text, ReportView, DEFAULT_TITLE};
use crate::windows::ReportWindows;
use crate::ynab::BudgetSource;

/// A computed and rendered report that has not been sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedReport {
    pub windows: ReportWindows,
    pub reports: Vec<GroupReport>,
    pub view: ReportView,
    pub email: ReportEmail,
    /// Transactions fetched for this run
    pub transaction_count: usize,
}

/// Outcome of a delivered run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub groups: usize,
    pub transactions: usize,
    pub sent_at: DateTime<Local>,
}

/// Runs the report pipeline against a data source and a mailer
#[derive(Clone)]
pub struct ReportRunner {
    source: Arc<dyn BudgetSource>,
    mailer: Option<Arc<dyn Mailer>>,
    config: EngineConfig,
    title: String,
    subject: String,
}

impl ReportRunner {
    pub fn new(source: Arc<dyn BudgetSource>, config: EngineConfig) -> Self {
        Self {
            source,
            mailer: None,
            config,
            title: DEFAULT_TITLE.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Heading shown at the top of the report body
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch, aggregate and render without sending
    pub async fn prepare(&self, today: NaiveDate) -> Result<PreparedReport> {
        let windows = ReportWindows::for_date(today);

        let groups = self.source.category_groups().await?;
        let transactions = self
            .source
            .transactions_since(windows.history_start())
            .await?;
        debug!(
            groups = groups.len(),
            transactions = transactions.len(),
            since = %windows.history_start(),
            "Fetched report snapshot"
        );

        let reports = compute_report(&groups, &transactions, &windows, &self.config);
        let view = ReportView::from_reports(self.title.clone(), &reports);
        let email = ReportEmail {
            subject: self.subject.clone(),
            html: render_html(&view),
            text: render_text(&view),
        };

        Ok(PreparedReport {
            windows,
            reports,
            view,
            email,
            transaction_count: transactions.len(),
        })
    }

    /// Run the whole pipeline for `today` and send the report
    pub async fn run_once(&self, today: NaiveDate) -> Result<RunSummary> {
        let mailer = self
            .mailer
            .as_ref()
            .ok_or_else(|| Error::Config("No mailer configured for report delivery".into()))?;

        info!("Sending weekly report for {}", today);
        let prepared = self.prepare(today).await?;
        mailer.send(&prepared.email).await?;

        let summary = RunSummary {
            groups: prepared.reports.len(),
            transactions: prepared.transaction_count,
            sent_at: Local::now(),
        };
        info!(
            groups = summary.groups,
            transactions = summary.transactions,
            "Sent weekly report at {}",
            summary.sent_at.to_rfc3339()
        );
        Ok(summary)
    }
}
