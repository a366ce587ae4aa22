//! Scheduled delivery command

use anyhow::{Context, Result};
use chrono::Local;
use spendbrief_core::ScheduleConfig;
use tracing::info;

use super::mailing_runner_from_env;
use crate::scheduler::start_report_scheduler;

pub async fn cmd_schedule() -> Result<()> {
    let config = ScheduleConfig::from_env().context("Failed to read report schedules")?;
    let runner = mailing_runner_from_env()?;

    let now = Local::now();
    println!("⏰ Starting Spendbrief scheduler...");
    for schedule in &config.schedules {
        match schedule.next_after(&now) {
            Some(next) => println!(
                "   {}  next: {}",
                schedule,
                next.format("%a %Y-%m-%d %H:%M")
            ),
            None => println!("   {}  next: (none)", schedule),
        }
    }
    println!("   Press Ctrl+C to stop");

    let handles = start_report_scheduler(runner, config);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Shutting down scheduler");
    for handle in handles {
        handle.abort();
    }
    Ok(())
}
