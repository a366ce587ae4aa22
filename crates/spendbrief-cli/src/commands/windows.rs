//! Window inspection command

use anyhow::Result;
use spendbrief_core::ReportWindows;

use super::resolve_date;

pub fn cmd_windows(date: Option<&str>) -> Result<()> {
    let today = resolve_date(date)?;
    let windows = ReportWindows::for_date(today);

    println!();
    println!("📅 Report windows for {}", today);
    println!("   ─────────────────────────────────────────────");
    for line in window_lines(&windows) {
        println!("   {}", line);
    }
    println!();
    println!("   Fetching transactions since {}", windows.history_start());
    println!();
    Ok(())
}

/// One aligned line per window
pub fn window_lines(windows: &ReportWindows) -> Vec<String> {
    windows
        .iter()
        .map(|(kind, window)| {
            format!(
                "{:<12} {}  ({} days)",
                kind.label(),
                window,
                window.days()
            )
        })
        .collect()
}
