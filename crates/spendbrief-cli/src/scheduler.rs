//! Background scheduler for the weekly report
//!
//! Each configured schedule gets its own tokio task that sleeps until the
//! next firing time and then runs the report. All tasks share one run
//! guard, so a trigger that fires while another run is still in progress
//! is skipped rather than sending a second report.
//!
//! - `SPENDBRIEF_SCHEDULES`: `;`-separated cron expressions (default: `0 10 * * 1`)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use spendbrief_core::{ReportRunner, RunSummary, ScheduleConfig, ReportSchedule};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Shared flag marking a report run in progress
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` if a run is already active
    pub fn try_acquire(&self) -> Option<ActiveRun> {
        if self.running.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(ActiveRun {
            running: self.running.clone(),
        })
    }
}

/// Releases the guard when dropped
#[derive(Debug)]
pub struct ActiveRun {
    running: Arc<AtomicBool>,
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Start one background task per schedule
pub fn start_report_scheduler(runner: ReportRunner, config: ScheduleConfig) -> Vec<JoinHandle<()>> {
    let guard = RunGuard::new();

    config
        .schedules
        .into_iter()
        .map(|schedule| {
            info!("Starting report scheduler: {}", schedule);
            let runner = runner.clone();
            let guard = guard.clone();
            tokio::spawn(async move { schedule_loop(runner, schedule, guard).await })
        })
        .collect()
}

async fn schedule_loop(runner: ReportRunner, schedule: ReportSchedule, guard: RunGuard) {
    loop {
        let now = Local::now();
        let Some(next) = schedule.next_after(&now) else {
            error!("Schedule {} has no upcoming firing time, stopping", schedule);
            return;
        };

        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(
            schedule = %schedule,
            next = %next.to_rfc3339(),
            "Waiting {}s for next report",
            wait.as_secs()
        );
        tokio::time::sleep(wait).await;

        info!("Running scheduled report ({})", schedule);
        run_scheduled_report(&runner, &guard, next.date_naive()).await;
    }
}

/// Run one scheduled report unless another run holds the guard
///
/// Failures are logged and swallowed so the schedule keeps going.
pub async fn run_scheduled_report(
    runner: &ReportRunner,
    guard: &RunGuard,
    today: NaiveDate,
) -> Option<RunSummary> {
    let Some(_active) = guard.try_acquire() else {
        warn!("Skipping scheduled report: another run is still in progress");
        return None;
    };

    match runner.run_once(today).await {
        Ok(summary) => {
            info!(
                "Scheduled report completed: {} groups, {} transactions",
                summary.groups, summary.transactions
            );
            Some(summary)
        }
        Err(e) => {
            error!("Scheduled report failed: {}", error_chain(&e));
            None
        }
    }
}

/// An error and its sources joined with `: `
///
/// A source whose message is already part of the text is skipped.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !text.contains(&message) {
            text.push_str(": ");
            text.push_str(&message);
        }
        source = cause.source();
    }
    text
}
