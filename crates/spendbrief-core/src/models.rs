//! Domain models for Spendbrief
//!
//! These mirror the subset of the YNAB API payloads that the report needs.
//! Unknown fields in API responses are ignored during deserialization.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Money amount in thousandths of the display currency unit
///
/// YNAB reports every amount in "milliunits": `-12340` is an outflow of
/// $12.34. Outflows (spending) are negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Milliunits(pub i64);

impl Milliunits {
    pub const ZERO: Milliunits = Milliunits(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Milliunits {
    /// Formats as dollars with two decimals, rounding half away from zero.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = (self.0.unsigned_abs() + 5) / 10;
        let sign = if self.0 < 0 && cents > 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, cents / 100, cents % 100)
    }
}

impl Add for Milliunits {
    type Output = Milliunits;

    fn add(self, rhs: Self) -> Self::Output {
        Milliunits(self.0 + rhs.0)
    }
}

impl AddAssign for Milliunits {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Milliunits {
    type Output = Milliunits;

    fn sub(self, rhs: Self) -> Self::Output {
        Milliunits(self.0 - rhs.0)
    }
}

impl Neg for Milliunits {
    type Output = Milliunits;

    fn neg(self) -> Self::Output {
        Milliunits(-self.0)
    }
}

impl Sum for Milliunits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Milliunits::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Milliunits> for Milliunits {
    fn sum<I: Iterator<Item = &'a Milliunits>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<i64> for Milliunits {
    fn from(value: i64) -> Self {
        Milliunits(value)
    }
}

/// A transaction as returned by the budgeting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Calendar day the transaction was made (no time-of-day)
    pub date: NaiveDate,
    pub amount: Milliunits,
    /// Category of a plain transaction; ignored when `subtransactions` is non-empty
    pub category_id: Option<String>,
    pub payee_name: Option<String>,
    /// Split lines; their amounts add up to `amount`
    #[serde(default)]
    pub subtransactions: Vec<SubTransaction>,
}

impl Transaction {
    /// Whether this transaction is a split across several categories
    pub fn is_split(&self) -> bool {
        !self.subtransactions.is_empty()
    }
}

/// One line of a split transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTransaction {
    pub amount: Milliunits,
    pub category_id: Option<String>,
}

/// A named collection of budget categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// A budget category with its budgeted amount for the current month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    pub budgeted: Milliunits,
}
