//! Ledger entities: wallets, expense/income entries and monthly budgets.
//!
//! All amounts are whole Vietnamese đồng stored as `i64`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub balance: i64,
    pub currency: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Expense,
    Income,
}

impl EntryKind {
    /// Signed change this entry applies to its wallet balance.
    pub fn balance_delta(self, amount: i64) -> i64 {
        match self {
            EntryKind::Expense => -amount,
            EntryKind::Income => amount,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Expense => write!(f, "expense"),
            EntryKind::Income => write!(f, "income"),
        }
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expense" => Ok(EntryKind::Expense),
            "income" => Ok(EntryKind::Income),
            other => Err(format!("invalid entry kind: '{other}'")),
        }
    }
}

/// A recorded ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub amount: i64,
    pub category: String,
    pub description: String,
    pub kind: EntryKind,
    pub occurred_at: DateTime<Utc>,
}

/// Input for recording a new entry. The wallet balance moves in the same transaction.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub amount: i64,
    pub category: String,
    pub description: String,
    pub kind: EntryKind,
    pub occurred_at: DateTime<Utc>,
}

/// A spending limit for one category in one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub amount_limit: i64,
    pub month: u32,
    pub year: i32,
}

/// Result of a budget upsert.
#[derive(Debug, Clone)]
pub struct BudgetUpsert {
    pub budget: Budget,
    /// `true` when no budget existed for the (category, month, year) key.
    pub created: bool,
}

/// Total spent in one category over some window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub total: i64,
}

/// A calendar month, used as the budget key and for spend windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetPeriod {
    pub month: u32,
    pub year: i32,
}

impl BudgetPeriod {
    /// Returns `None` when `month` is outside 1..=12.
    pub fn new(month: u32, year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { month, year })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// First day of the following month (exclusive upper bound).
    pub fn next_first_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
    }

    /// `[start, end)` bounds of the month in UTC.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (start_of_day(self.first_day()), start_of_day(self.next_first_day()))
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
