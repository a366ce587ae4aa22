//! Spendbrief Core Library
//!
//! Shared functionality for the Spendbrief weekly spending report:
//! - Report windows (last four weeks, this month, last month)
//! - Aggregation engine (per-group window sums and monthly superlatives)
//! - Report view model and HTML/text rendering
//! - YNAB API client behind the `BudgetSource` trait
//! - SMTP delivery behind the `Mailer` trait
//! - Weekly schedule parsing
//! - The end-to-end report pipeline

pub mod aggregate;
pub mod error;
pub mod mail;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod schedule;
pub mod windows;
pub mod ynab;

/// Test utilities including mock YNAB server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{
    attribute_amount, compute_group_report, compute_report, AttributionSet, EngineConfig,
    GroupReport, PayeeTotal, Purchase,
};
pub use error::{Error, Result};
pub use mail::{Mailer, ReportEmail, SmtpConfig, SmtpMailer};
pub use models::{Category, CategoryGroup, Milliunits, SubTransaction, Transaction};
pub use pipeline::{PreparedReport, ReportRunner, RunSummary};
pub use render::{render_html, render_text, GroupView, ReportView, Tone, ViewCell, ViewRow};
pub use schedule::{ScheduleConfig, ReportSchedule};
pub use windows::{DateWindow, ReportWindows, WindowKind};
pub use ynab::{BudgetSource, YnabClient, YnabConfig};
