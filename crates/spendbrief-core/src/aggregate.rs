//! Spending aggregation
//!
//! Sums transaction amounts per category group over the report windows and
//! picks the current month's superlatives (largest purchase, top payee).
//!
//! Everything here is pure: the same snapshot always produces the same
//! report, and nothing is cached between calls.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CategoryGroup, Milliunits, Transaction};
use crate::windows::{DateWindow, ReportWindows, WindowKind};

/// YNAB's starting-balance category, counted toward every group
pub const STARTING_BALANCE_CATEGORY_ID: &str = "f5cca4f0-a403-4992-834e-73acdebd3865";

/// Overrides the starting-balance category id; an empty value disables it
pub const STARTING_BALANCE_CATEGORY_ENV: &str = "SPENDBRIEF_STARTING_BALANCE_CATEGORY";

/// Budget-internal groups that never appear in the report
pub const EXCLUDED_GROUP_NAMES: [&str; 3] = [
    "Credit Card Goals",
    "Internal Master Category",
    "Hidden Categories",
];

/// Tunables for the aggregation engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Category attributed to every group; `None` disables the special case
    pub starting_balance_category_id: Option<String>,
    /// Group names skipped entirely (exact, case-sensitive match)
    pub excluded_group_names: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_balance_category_id: Some(STARTING_BALANCE_CATEGORY_ID.to_string()),
            excluded_group_names: EXCLUDED_GROUP_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EngineConfig {
    /// Default configuration with the starting-balance id taken from the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(id) = std::env::var(STARTING_BALANCE_CATEGORY_ENV) {
            let id = id.trim();
            config.starting_balance_category_id = (!id.is_empty()).then(|| id.to_string());
        }
        config
    }

    /// Whether a group belongs in the report
    pub fn includes_group(&self, group: &CategoryGroup) -> bool {
        !group.hidden && !self.excluded_group_names.iter().any(|name| *name == group.name)
    }
}

/// Category ids whose amounts count toward one group
#[derive(Debug, Clone)]
pub struct AttributionSet<'a> {
    category_ids: HashSet<&'a str>,
    starting_balance_id: Option<&'a str>,
}

impl<'a> AttributionSet<'a> {
    pub fn new(
        category_ids: impl IntoIterator<Item = &'a str>,
        starting_balance_id: Option<&'a str>,
    ) -> Self {
        Self {
            category_ids: category_ids.into_iter().collect(),
            starting_balance_id,
        }
    }

    /// The group's visible categories plus the starting-balance category
    pub fn for_group(group: &'a CategoryGroup, config: &'a EngineConfig) -> Self {
        Self::new(
            group
                .categories
                .iter()
                .filter(|c| !c.hidden)
                .map(|c| c.id.as_str()),
            config.starting_balance_category_id.as_deref(),
        )
    }

    pub fn len(&self) -> usize {
        self.category_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.category_ids.is_empty()
    }

    /// Whether a category belongs to the group itself
    pub fn contains(&self, category_id: Option<&str>) -> bool {
        category_id.is_some_and(|id| self.category_ids.contains(id))
    }

    fn attributes(&self, category_id: Option<&str>) -> bool {
        self.contains(category_id)
            || (category_id.is_some() && category_id == self.starting_balance_id)
    }

    /// Portion of a transaction that belongs to the group
    ///
    /// Split transactions contribute only their matching lines; the parent's
    /// own category is ignored.
    pub fn amount_of(&self, transaction: &Transaction) -> Milliunits {
        if transaction.is_split() {
            transaction
                .subtransactions
                .iter()
                .filter(|sub| self.contains(sub.category_id.as_deref()))
                .map(|sub| sub.amount)
                .sum()
        } else if self.attributes(transaction.category_id.as_deref()) {
            transaction.amount
        } else {
            Milliunits::ZERO
        }
    }

    /// Whether `amount_of` can be non-zero for this transaction
    pub fn is_relevant(&self, transaction: &Transaction) -> bool {
        if transaction.is_split() {
            transaction
                .subtransactions
                .iter()
                .any(|sub| self.contains(sub.category_id.as_deref()))
        } else {
            self.attributes(transaction.category_id.as_deref())
        }
    }
}

/// Sum of the group's share of every transaction dated inside `window`
pub fn attribute_amount<'t>(
    transactions: impl IntoIterator<Item = &'t Transaction>,
    attribution: &AttributionSet<'_>,
    window: &DateWindow,
) -> Milliunits {
    transactions
        .into_iter()
        .filter(|t| window.contains(t.date))
        .map(|t| attribution.amount_of(t))
        .sum()
}

/// The transaction with the most negative share of the group's month
///
/// `amount` is the group's share, which for a split is only its matching lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub amount: Milliunits,
    pub payee_name: Option<String>,
}

/// The payee with the most negative attributed total for the month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeeTotal {
    pub payee_name: Option<String>,
    pub total: Milliunits,
    pub transaction_count: usize,
}

/// Figures for one category group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReport {
    pub group_id: String,
    pub group_name: String,
    pub last_week: Milliunits,
    pub two_weeks_ago: Milliunits,
    pub three_weeks_ago: Milliunits,
    pub four_weeks_ago: Milliunits,
    pub this_month: Milliunits,
    pub last_month: Milliunits,
    pub budgeted: Milliunits,
    /// `None` when the group has no transactions this month
    pub largest_purchase: Option<Purchase>,
    /// `None` when the group has no transactions this month
    pub spent_most_at: Option<PayeeTotal>,
}

impl GroupReport {
    pub fn amount(&self, kind: WindowKind) -> Milliunits {
        match kind {
            WindowKind::LastWeek => self.last_week,
            WindowKind::TwoWeeksAgo => self.two_weeks_ago,
            WindowKind::ThreeWeeksAgo => self.three_weeks_ago,
            WindowKind::FourWeeksAgo => self.four_weeks_ago,
            WindowKind::ThisMonth => self.this_month,
            WindowKind::LastMonth => self.last_month,
        }
    }

    /// Last week minus the week before (negative means more spending)
    pub fn week_over_week(&self) -> Milliunits {
        self.last_week - self.two_weeks_ago
    }

    /// This month so far minus last month (negative means more spending)
    pub fn month_over_month(&self) -> Milliunits {
        self.this_month - self.last_month
    }
}

/// Build the report for one category group
pub fn compute_group_report(
    group: &CategoryGroup,
    transactions: &[Transaction],
    windows: &ReportWindows,
    config: &EngineConfig,
) -> GroupReport {
    let attribution = AttributionSet::for_group(group, config);

    let relevant: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| attribution.is_relevant(t))
        .collect();

    let sum = |window: &DateWindow| attribute_amount(relevant.iter().copied(), &attribution, window);

    let this_month: Vec<&Transaction> = relevant
        .iter()
        .copied()
        .filter(|t| windows.this_month.contains(t.date))
        .collect();

    // Ranked by the group's share so a split never outweighs the group's month
    let largest_purchase = this_month
        .iter()
        .map(|t| (t, attribution.amount_of(t)))
        .min_by_key(|(_, amount)| *amount)
        .map(|(t, amount)| Purchase {
            transaction_id: t.id.clone(),
            date: t.date,
            amount,
            payee_name: t.payee_name.clone(),
        });

    let spent_most_at = group_by_payee(&this_month)
        .into_iter()
        .map(|(payee_name, payee_transactions)| PayeeTotal {
            payee_name: payee_name.map(str::to_string),
            total: attribute_amount(
                payee_transactions.iter().copied(),
                &attribution,
                &windows.this_month,
            ),
            transaction_count: payee_transactions.len(),
        })
        .min_by_key(|p| p.total);

    let report = GroupReport {
        group_id: group.id.clone(),
        group_name: group.name.clone(),
        last_week: sum(&windows.last_week),
        two_weeks_ago: sum(&windows.two_weeks_ago),
        three_weeks_ago: sum(&windows.three_weeks_ago),
        four_weeks_ago: sum(&windows.four_weeks_ago),
        this_month: sum(&windows.this_month),
        last_month: sum(&windows.last_month),
        budgeted: group.categories.iter().map(|c| c.budgeted).sum(),
        largest_purchase,
        spent_most_at,
    };

    debug!(
        group = %report.group_name,
        categories = attribution.len(),
        transactions = relevant.len(),
        this_month = %report.this_month,
        "Computed group report"
    );

    report
}

/// Build the report for every visible group, in input order
pub fn compute_report(
    groups: &[CategoryGroup],
    transactions: &[Transaction],
    windows: &ReportWindows,
    config: &EngineConfig,
) -> Vec<GroupReport> {
    groups
        .iter()
        .filter(|g| config.includes_group(g))
        .map(|g| compute_group_report(g, transactions, windows, config))
        .collect()
}

/// Group by payee name, keeping payees in order of first appearance
fn group_by_payee<'t>(
    transactions: &[&'t Transaction],
) -> Vec<(Option<&'t str>, Vec<&'t Transaction>)> {
    let mut groups: Vec<(Option<&'t str>, Vec<&'t Transaction>)> = Vec::new();

    for &transaction in transactions {
        let payee = transaction.payee_name.as_deref();
        match groups.iter_mut().find(|(name, _)| *name == payee) {
            Some((_, members)) => members.push(transaction),
            None => groups.push((payee, vec![transaction])),
        }
    }

    groups
}
