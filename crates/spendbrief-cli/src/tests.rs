//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::sync::Arc;

use chrono::NaiveDate;
use clap::Parser;
use spendbrief_core::test_utils::{MockYnabServer, RecordingMailer, StaticSource, YnabFixture};
use spendbrief_core::{
    Category, CategoryGroup, EngineConfig, Milliunits, ReportRunner, ReportWindows, Transaction,
    YnabClient,
};

use crate::cli::{Cli, Commands};
use crate::commands;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn groceries() -> Vec<CategoryGroup> {
    vec![CategoryGroup {
        id: "g1".to_string(),
        name: "Groceries".to_string(),
        hidden: false,
        categories: vec![Category {
            id: "food".to_string(),
            name: "Food".to_string(),
            hidden: false,
            budgeted: Milliunits(50000),
        }],
    }]
}

fn purchases() -> Vec<Transaction> {
    [("t1", 4, -12000, "A"), ("t2", 5, -8000, "A"), ("t3", 11, -5000, "B")]
        .into_iter()
        .map(|(id, day, amount, payee)| Transaction {
            id: id.to_string(),
            date: date(2024, 3, day),
            amount: Milliunits(amount),
            category_id: Some("food".to_string()),
            payee_name: Some(payee.to_string()),
            subtransactions: vec![],
        })
        .collect()
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_run_dry_run_with_date() {
    let cli = Cli::try_parse_from(["spendbrief", "run", "--dry-run", "--date", "2024-03-13"]).unwrap();
    match cli.command {
        Commands::Run {
            dry_run,
            html,
            date,
        } => {
            assert!(dry_run);
            assert!(!html);
            assert_eq!(date.as_deref(), Some("2024-03-13"));
        }
        _ => panic!("expected run command"),
    }
}

#[test]
fn test_parse_html_requires_dry_run() {
    assert!(Cli::try_parse_from(["spendbrief", "run", "--html"]).is_err());
    assert!(Cli::try_parse_from(["spendbrief", "run", "--dry-run", "--html"]).is_ok());
}

#[test]
fn test_parse_global_verbose() {
    let cli = Cli::try_parse_from(["spendbrief", "schedule", "--verbose"]).unwrap();
    assert!(cli.verbose);
    assert!(matches!(cli.command, Commands::Schedule));
}

// ========== Date Resolution Tests ==========

#[test]
fn test_parse_global_env_file() {
    let cli = Cli::try_parse_from(["spendbrief", "windows", "--env-file", "prod.env"]).unwrap();
    assert_eq!(cli.env_file.as_deref(), Some(std::path::Path::new("prod.env")));
}

// ========== Environment File Tests ==========

#[test]
fn test_load_env_file_sets_missing_variables() {
    let path = std::env::temp_dir().join(format!("spendbrief-{}.env", std::process::id()));
    std::fs::write(
        &path,
        "SPENDBRIEF_TEST_ENV_FILE_BUDGET=budget-from-file\nSPENDBRIEF_TEST_ENV_FILE_KEEP=from-file\n",
    )
    .unwrap();
    std::env::set_var("SPENDBRIEF_TEST_ENV_FILE_KEEP", "from-process");

    let loaded = commands::load_env_file(Some(&path)).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.as_deref(), Some(path.as_path()));
    assert_eq!(
        std::env::var("SPENDBRIEF_TEST_ENV_FILE_BUDGET").unwrap(),
        "budget-from-file"
    );
    // The process environment wins over the file
    assert_eq!(
        std::env::var("SPENDBRIEF_TEST_ENV_FILE_KEEP").unwrap(),
        "from-process"
    );
}

#[test]
fn test_load_env_file_missing_explicit_path_fails() {
    let path = std::env::temp_dir().join("spendbrief-does-not-exist.env");
    let err = commands::load_env_file(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("Failed to load env file"));
}

#[test]
fn test_resolve_date() {
    assert_eq!(
        commands::resolve_date(Some("2024-02-29")).unwrap(),
        date(2024, 2, 29)
    );
    assert!(commands::resolve_date(Some("2024-02-30")).is_err());
    assert!(commands::resolve_date(Some("03/13/2024")).is_err());
    assert!(commands::resolve_date(None).is_ok());
}

// ========== Windows Command Tests ==========

#[test]
fn test_window_lines() {
    let windows = ReportWindows::for_date(date(2024, 3, 13));
    let lines = commands::window_lines(&windows);

    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("Last Week"));
    assert!(lines[0].contains("2024-03-03 to 2024-03-09"));
    assert!(lines[0].contains("(7 days)"));
    assert!(lines[5].starts_with("Last Month"));
    assert!(lines[5].contains("(29 days)"));
}

#[test]
fn test_cmd_windows() {
    assert!(commands::cmd_windows(Some("2024-03-13")).is_ok());
    assert!(commands::cmd_windows(Some("not-a-date")).is_err());
}

// ========== Run Command Tests ==========

#[tokio::test]
async fn test_preview_report_does_not_send() {
    let mailer = Arc::new(RecordingMailer::new());
    let runner = ReportRunner::new(
        Arc::new(StaticSource::new(groceries(), purchases())),
        EngineConfig::default(),
    )
    .with_mailer(mailer.clone());

    let prepared = commands::preview_report(&runner, date(2024, 3, 13))
        .await
        .unwrap();
    assert_eq!(prepared.reports[0].this_month, Milliunits(-25000));
    assert!(prepared.email.text.contains("Spent Most At: -$20.00 @ A"));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_send_report() {
    let mailer = Arc::new(RecordingMailer::new());
    let runner = ReportRunner::new(
        Arc::new(StaticSource::new(groceries(), purchases())),
        EngineConfig::default(),
    )
    .with_mailer(mailer.clone());

    let summary = commands::send_report(&runner, date(2024, 3, 13))
        .await
        .unwrap();
    assert_eq!(summary.groups, 1);
    assert_eq!(summary.transactions, 3);
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_send_report_failure_has_context() {
    let runner = ReportRunner::new(
        Arc::new(StaticSource::new(groceries(), purchases())),
        EngineConfig::default(),
    )
    .with_mailer(Arc::new(RecordingMailer::failing()));

    let err = commands::send_report(&runner, date(2024, 3, 13))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to send weekly report");
}

#[tokio::test]
async fn test_send_report_from_mock_ynab() {
    let server = MockYnabServer::start(YnabFixture::new(groceries(), purchases())).await;
    let mailer = Arc::new(RecordingMailer::new());
    let runner = ReportRunner::new(
        Arc::new(YnabClient::new(server.config())),
        EngineConfig::default(),
    )
    .with_mailer(mailer.clone());

    let summary = commands::send_report(&runner, date(2024, 3, 13))
        .await
        .unwrap();
    assert_eq!(summary.transactions, 3);
    assert_eq!(server.since_dates(), vec!["2024-02-01".to_string()]);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html.contains("Groceries"));
}
