//! SQLite ledger repository implementation.
//!
//! Wallet balances and entries move together: `record_expense` updates the
//! balance and inserts the entry inside one writer transaction, so a failure
//! at either step leaves neither change behind.

use chrono::{DateTime, Utc};
use moneykeeper_core::ledger::repository::LedgerRepository;
use moneykeeper_types::error::RepositoryError;
use moneykeeper_types::ledger::{
    Budget, BudgetPeriod, BudgetUpsert, CategorySpend, EntryKind, Expense, NewExpense, Wallet,
};
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid, query_error};

/// SQLite-backed implementation of `LedgerRepository`.
pub struct SqliteLedgerRepository {
    pool: DatabasePool,
}

impl SqliteLedgerRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Open a wallet for a user. A new default wallet clears the flag on the
    /// user's other wallets.
    pub async fn create_wallet(
        &self,
        user_id: &Uuid,
        name: &str,
        balance: i64,
        is_default: bool,
    ) -> Result<Wallet, RepositoryError> {
        let wallet = Wallet {
            id: Uuid::now_v7(),
            user_id: *user_id,
            name: name.to_string(),
            balance,
            currency: "VND".to_string(),
            is_default,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        if is_default {
            sqlx::query("UPDATE wallets SET is_default = 0 WHERE user_id = ?")
                .bind(user_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }

        sqlx::query(
            "INSERT INTO wallets (id, user_id, name, balance, currency, is_default, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(wallet.id.to_string())
        .bind(wallet.user_id.to_string())
        .bind(&wallet.name)
        .bind(wallet.balance)
        .bind(&wallet.currency)
        .bind(wallet.is_default)
        .bind(format_datetime(&wallet.created_at))
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(wallet)
    }
}

struct WalletRow {
    id: String,
    user_id: String,
    name: String,
    balance: i64,
    currency: String,
    is_default: bool,
    created_at: String,
}

impl WalletRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            balance: row.try_get("balance")?,
            currency: row.try_get("currency")?,
            is_default: row.try_get("is_default")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_wallet(self) -> Result<Wallet, RepositoryError> {
        Ok(Wallet {
            id: parse_uuid(&self.id, "wallet id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            name: self.name,
            balance: self.balance,
            currency: self.currency,
            is_default: self.is_default,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct BudgetRow {
    id: String,
    user_id: String,
    category: String,
    amount_limit: i64,
    month: i64,
    year: i64,
}

impl BudgetRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            category: row.try_get("category")?,
            amount_limit: row.try_get("amount_limit")?,
            month: row.try_get("month")?,
            year: row.try_get("year")?,
        })
    }

    fn into_budget(self) -> Result<Budget, RepositoryError> {
        Ok(Budget {
            id: parse_uuid(&self.id, "budget id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            category: self.category,
            amount_limit: self.amount_limit,
            month: self.month as u32,
            year: self.year as i32,
        })
    }
}

impl LedgerRepository for SqliteLedgerRepository {
    async fn list_wallets(&self, user_id: &Uuid) -> Result<Vec<Wallet>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM wallets WHERE user_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| WalletRow::from_row(row).map_err(query_error)?.into_wallet())
            .collect()
    }

    async fn record_expense(&self, entry: &NewExpense) -> Result<Expense, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        // Ownership is part of the WHERE clause: another user's wallet looks missing.
        let updated = sqlx::query(
            "UPDATE wallets SET balance = balance + ? WHERE id = ? AND user_id = ?",
        )
        .bind(entry.kind.balance_delta(entry.amount))
        .bind(entry.wallet_id.to_string())
        .bind(entry.user_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let expense = Expense {
            id: Uuid::now_v7(),
            user_id: entry.user_id,
            wallet_id: entry.wallet_id,
            amount: entry.amount,
            category: entry.category.clone(),
            description: entry.description.clone(),
            kind: entry.kind,
            occurred_at: entry.occurred_at,
        };

        // Dropping `tx` on error rolls the balance change back.
        sqlx::query(
            "INSERT INTO expenses (id, user_id, wallet_id, amount, category, description, kind, occurred_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(expense.id.to_string())
        .bind(expense.user_id.to_string())
        .bind(expense.wallet_id.to_string())
        .bind(expense.amount)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.kind.to_string())
        .bind(format_datetime(&expense.occurred_at))
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        debug!(expense_id = %expense.id, wallet_id = %expense.wallet_id, "ledger entry recorded");
        Ok(expense)
    }

    async fn upsert_budget(
        &self,
        user_id: &Uuid,
        category: &str,
        amount_limit: i64,
        period: BudgetPeriod,
    ) -> Result<BudgetUpsert, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let existing: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM budgets WHERE user_id = ? AND category = ? AND month = ? AND year = ?",
        )
        .bind(user_id.to_string())
        .bind(category)
        .bind(period.month as i64)
        .bind(period.year as i64)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_error)?;

        let (id, created) = match existing {
            Some((id,)) => {
                sqlx::query("UPDATE budgets SET amount_limit = ?, updated_at = ? WHERE id = ?")
                    .bind(amount_limit)
                    .bind(&now)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await
                    .map_err(query_error)?;
                (parse_uuid(&id, "budget id")?, false)
            }
            None => {
                let id = Uuid::now_v7();
                sqlx::query(
                    "INSERT INTO budgets (id, user_id, category, amount_limit, month, year, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(id.to_string())
                .bind(user_id.to_string())
                .bind(category)
                .bind(amount_limit)
                .bind(period.month as i64)
                .bind(period.year as i64)
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
                (id, true)
            }
        };

        tx.commit().await.map_err(query_error)?;

        Ok(BudgetUpsert {
            budget: Budget {
                id,
                user_id: *user_id,
                category: category.to_string(),
                amount_limit,
                month: period.month,
                year: period.year,
            },
            created,
        })
    }

    async fn budgets_for_period(
        &self,
        user_id: &Uuid,
        period: BudgetPeriod,
    ) -> Result<Vec<Budget>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM budgets WHERE user_id = ? AND month = ? AND year = ? ORDER BY category ASC",
        )
        .bind(user_id.to_string())
        .bind(period.month as i64)
        .bind(period.year as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| BudgetRow::from_row(row).map_err(query_error)?.into_budget())
            .collect()
    }

    async fn spend_by_category_since(
        &self,
        user_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<CategorySpend>, RepositoryError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT category, SUM(amount) AS total FROM expenses
             WHERE user_id = ? AND kind = ? AND occurred_at >= ?
             GROUP BY category
             ORDER BY total DESC, category ASC",
        )
        .bind(user_id.to_string())
        .bind(EntryKind::Expense.to_string())
        .bind(format_datetime(&since))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        Ok(rows
            .into_iter()
            .map(|(category, total)| CategorySpend { category, total })
            .collect())
    }

    async fn spent_in_period(
        &self,
        user_id: &Uuid,
        category: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0) FROM expenses
             WHERE user_id = ? AND category = ? AND kind = ?
               AND occurred_at >= ? AND occurred_at < ?",
        )
        .bind(user_id.to_string())
        .bind(category)
        .bind(EntryKind::Expense.to_string())
        .bind(format_datetime(&start))
        .bind(format_datetime(&end))
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_error)?;

        Ok(total)
    }
}
