//! Report rendering
//!
//! Turns computed [`GroupReport`]s into a presentation-neutral view model
//! ([`ReportView`]) and renders that model as an HTML email body or plain
//! text. The aggregation engine never sees markup.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::aggregate::GroupReport;
use crate::models::Milliunits;
use crate::windows::WindowKind;

pub const DEFAULT_TITLE: &str = "Weekly Spending Report";

/// Shown in place of a superlative when the month has no transactions
pub const NO_PURCHASES: &str = "No purchases this month";

const UNKNOWN_PAYEE: &str = "Unknown payee";

/// Direction of a difference cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Spending went down (or stayed the same)
    Up,
    /// Spending went up
    Down,
}

impl Tone {
    /// Tone for a change from `older` to `newer`
    ///
    /// Amounts are signed with outflows negative, so a lower newer value
    /// means more was spent.
    pub fn for_change(newer: Milliunits, older: Milliunits) -> Self {
        if newer < older {
            Tone::Down
        } else {
            Tone::Up
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Tone::Up => "green",
            Tone::Down => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCell {
    pub label: String,
    pub value: String,
    pub tone: Option<Tone>,
}

impl ViewCell {
    fn plain(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            tone: None,
        }
    }

    fn difference(newer: Milliunits, older: Milliunits) -> Self {
        Self {
            label: "Difference".to_string(),
            value: (newer - older).to_string(),
            tone: Some(Tone::for_change(newer, older)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRow {
    pub cells: Vec<ViewCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub name: String,
    pub rows: Vec<ViewRow>,
}

impl GroupView {
    /// Three rows: weekly trend, month comparison, budget and superlatives
    pub fn from_report(report: &GroupReport) -> Self {
        let weekly = [
            WindowKind::FourWeeksAgo,
            WindowKind::ThreeWeeksAgo,
            WindowKind::TwoWeeksAgo,
            WindowKind::LastWeek,
        ]
        .into_iter()
        .map(|kind| ViewCell::plain(kind.label(), report.amount(kind).to_string()))
        .chain(std::iter::once(ViewCell::difference(
            report.last_week,
            report.two_weeks_ago,
        )))
        .collect();

        let monthly = vec![
            ViewCell::plain(WindowKind::LastMonth.label(), report.last_month.to_string()),
            ViewCell::plain(WindowKind::ThisMonth.label(), report.this_month.to_string()),
            ViewCell::difference(report.this_month, report.last_month),
        ];

        let largest = report
            .largest_purchase
            .as_ref()
            .map(|p| at_payee(p.amount, p.payee_name.as_deref()))
            .unwrap_or_else(|| NO_PURCHASES.to_string());
        let spent_most = report
            .spent_most_at
            .as_ref()
            .map(|p| at_payee(p.total, p.payee_name.as_deref()))
            .unwrap_or_else(|| NO_PURCHASES.to_string());

        let summary = vec![
            ViewCell::plain("Budgeted", report.budgeted.to_string()),
            ViewCell::plain("Largest Purchase", largest),
            ViewCell::plain("Spent Most At", spent_most),
        ];

        Self {
            name: report.group_name.clone(),
            rows: vec![
                ViewRow { cells: weekly },
                ViewRow { cells: monthly },
                ViewRow { cells: summary },
            ],
        }
    }
}

fn at_payee(amount: Milliunits, payee: Option<&str>) -> String {
    format!("{} @ {}", amount, payee.unwrap_or(UNKNOWN_PAYEE))
}

/// Everything needed to render one report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportView {
    pub title: String,
    pub groups: Vec<GroupView>,
}

impl ReportView {
    pub fn from_reports(title: impl Into<String>, reports: &[GroupReport]) -> Self {
        Self {
            title: title.into(),
            groups: reports.iter().map(GroupView::from_report).collect(),
        }
    }
}

/// Render the report as a self-contained HTML email body
pub fn render_html(view: &ReportView) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n");
    html.push_str(
        "<body style=\"font-family: Helvetica, Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\n",
    );
    let _ = writeln!(
        html,
        "<h1 style=\"font-size: 24px; text-align: center;\">{}</h1>\n<hr />",
        escape_html(&view.title)
    );

    for group in &view.groups {
        let _ = writeln!(
            html,
            "<h2 style=\"font-size: 16px; font-weight: bold; text-align: center; text-decoration: underline;\">{}</h2>",
            escape_html(&group.name)
        );

        for row in &group.rows {
            let width = 100 / row.cells.len().max(1);
            html.push_str("<table width=\"100%\" cellpadding=\"4\">\n  <tr>\n");
            for cell in &row.cells {
                let style = cell
                    .tone
                    .map(|tone| format!(" style=\"color: {}\"", tone.color()))
                    .unwrap_or_default();
                let _ = writeln!(
                    html,
                    "    <td style=\"text-align: center\" width=\"{}%\"><strong>{}</strong><br /><span{}>{}</span></td>",
                    width,
                    escape_html(&cell.label),
                    style,
                    escape_html(&cell.value)
                );
            }
            html.push_str("  </tr>\n</table>\n");
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Render the report as plain text
pub fn render_text(view: &ReportView) -> String {
    let mut text = String::new();

    let _ = writeln!(text, "{}", view.title);
    let _ = writeln!(text, "{}", "=".repeat(view.title.chars().count()));

    for group in &view.groups {
        let _ = writeln!(text);
        let _ = writeln!(text, "{}", group.name);
        let _ = writeln!(text, "{}", "-".repeat(group.name.chars().count()));
        for row in &group.rows {
            let line = row
                .cells
                .iter()
                .map(|cell| match cell.tone {
                    Some(Tone::Down) => format!("{}: {} (more spent)", cell.label, cell.value),
                    _ => format!("{}: {}", cell.label, cell.value),
                })
                .collect::<Vec<_>>()
                .join(" | ");
            let _ = writeln!(text, "  {}", line);
        }
    }

    if view.groups.is_empty() {
        let _ = writeln!(text);
        let _ = writeln!(text, "No category groups to report.");
    }

    text
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
