//! Report run command implementation

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use spendbrief_core::{
    EngineConfig, PreparedReport, ReportRunner, RunSummary, SmtpMailer, YnabClient,
};

use super::resolve_date;

/// Runner reading from YNAB, without delivery
pub fn runner_from_env() -> Result<ReportRunner> {
    let client = YnabClient::from_env().context("Failed to configure YNAB client")?;
    Ok(ReportRunner::new(Arc::new(client), EngineConfig::from_env()))
}

/// Runner reading from YNAB and delivering over SMTP
pub fn mailing_runner_from_env() -> Result<ReportRunner> {
    let mailer = SmtpMailer::from_env().context("Failed to configure SMTP delivery")?;
    Ok(runner_from_env()?.with_mailer(Arc::new(mailer)))
}

pub async fn cmd_run(date: Option<&str>, dry_run: bool, html: bool) -> Result<()> {
    let today = resolve_date(date)?;

    if dry_run {
        let runner = runner_from_env()?;
        let prepared = preview_report(&runner, today).await?;
        print_report(&prepared, html);
        return Ok(());
    }

    let runner = mailing_runner_from_env()?;
    let summary = send_report(&runner, today).await?;

    println!();
    println!("📧 Weekly report sent");
    println!("   Groups:       {}", summary.groups);
    println!("   Transactions: {}", summary.transactions);
    println!("   Sent at:      {}", summary.sent_at.format("%Y-%m-%d %H:%M:%S"));
    println!();
    Ok(())
}

/// Build the report for `today` without sending it
pub async fn preview_report(runner: &ReportRunner, today: NaiveDate) -> Result<PreparedReport> {
    runner
        .prepare(today)
        .await
        .context("Failed to build weekly report")
}

/// Build and send the report for `today`
pub async fn send_report(runner: &ReportRunner, today: NaiveDate) -> Result<RunSummary> {
    runner
        .run_once(today)
        .await
        .context("Failed to send weekly report")
}

fn print_report(prepared: &PreparedReport, html: bool) {
    if html {
        print!("{}", prepared.email.html);
        return;
    }

    println!();
    println!("📋 Dry run (not sent)");
    println!("   Subject: {}", prepared.email.subject);
    println!(
        "   Window:  {} to {} ({} transactions)",
        prepared.windows.history_start(),
        prepared.windows.this_month.end,
        prepared.transaction_count
    );
    println!();
    print!("{}", prepared.email.text);
}
