//! LedgerRepository trait definition.
//!
//! The pipeline only reads wallets, budgets and spend totals, and writes
//! entries and budgets through this port.

use chrono::{DateTime, Utc};
use moneykeeper_types::error::RepositoryError;
use moneykeeper_types::ledger::{
    Budget, BudgetPeriod, BudgetUpsert, CategorySpend, Expense, NewExpense, Wallet,
};
use uuid::Uuid;

/// Repository trait for wallet, entry and budget persistence.
///
/// Implementations live in moneykeeper-infra (`SqliteLedgerRepository`).
pub trait LedgerRepository: Send + Sync {
    /// The user's wallets, oldest first.
    fn list_wallets(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Wallet>, RepositoryError>> + Send;

    /// Insert the entry and move the wallet balance in one transaction.
    ///
    /// Returns `RepositoryError::NotFound` (and writes nothing) when the
    /// wallet does not exist or belongs to another user.
    fn record_expense(
        &self,
        entry: &NewExpense,
    ) -> impl std::future::Future<Output = Result<Expense, RepositoryError>> + Send;

    /// Create or overwrite the budget keyed by (user, category, month, year).
    fn upsert_budget(
        &self,
        user_id: &Uuid,
        category: &str,
        amount_limit: i64,
        period: BudgetPeriod,
    ) -> impl std::future::Future<Output = Result<BudgetUpsert, RepositoryError>> + Send;

    fn budgets_for_period(
        &self,
        user_id: &Uuid,
        period: BudgetPeriod,
    ) -> impl std::future::Future<Output = Result<Vec<Budget>, RepositoryError>> + Send;

    /// Expense totals per category since `since`, largest first. Income is excluded.
    fn spend_by_category_since(
        &self,
        user_id: &Uuid,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<CategorySpend>, RepositoryError>> + Send;

    /// Total spent in one category within `[start, end)`.
    fn spent_in_period(
        &self,
        user_id: &Uuid,
        category: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;
}
