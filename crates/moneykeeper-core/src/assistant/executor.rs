//! Command executor: validates a parsed command and applies it to the ledger.

use chrono::{NaiveDate, Utc};
use moneykeeper_types::command::{
    BudgetCommand, ExecutionEffect, ExecutionResult, ExpenseCommand, ParsedCommand,
};
use moneykeeper_types::error::{CommandError, RepositoryError};
use moneykeeper_types::ledger::{BudgetPeriod, NewExpense, Wallet};
use tracing::info;
use uuid::Uuid;

use super::category::{canonical_category, suggest_category};
use super::extractor::DEFAULT_DESCRIPTION;
use crate::ledger::repository::LedgerRepository;

pub struct CommandExecutor<'a, L: LedgerRepository> {
    ledger: &'a L,
}

impl<'a, L: LedgerRepository> CommandExecutor<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Apply `command` for `user_id`. `Ok(None)` for commands that change nothing.
    ///
    /// Validation errors are returned before any write. Never retried.
    pub async fn execute(
        &self,
        user_id: Uuid,
        command: &ParsedCommand,
        today: NaiveDate,
    ) -> Result<Option<ExecutionResult>, CommandError> {
        match command {
            ParsedCommand::CreateExpense(cmd) => self.create_expense(user_id, cmd).await.map(Some),
            ParsedCommand::CreateBudget(cmd) => {
                self.create_budget(user_id, cmd, today).await.map(Some)
            }
            ParsedCommand::Query => Ok(None),
        }
    }

    async fn create_expense(
        &self,
        user_id: Uuid,
        cmd: &ExpenseCommand,
    ) -> Result<ExecutionResult, CommandError> {
        let amount = cmd
            .amount
            .filter(|a| *a > 0)
            .ok_or_else(|| CommandError::Validation("Số tiền không hợp lệ".to_string()))?;
        let description = cmd
            .description
            .clone()
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        let category = match &cmd.category {
            Some(c) => canonical_category(c),
            None => suggest_category(&description).to_string(),
        };

        let wallets = self.ledger.list_wallets(&user_id).await?;
        let wallet = resolve_wallet(&wallets, cmd.wallet_id)?;

        let entry = NewExpense {
            user_id,
            wallet_id: wallet.id,
            amount,
            category: category.clone(),
            description: description.clone(),
            kind: cmd.kind,
            occurred_at: Utc::now(),
        };
        let expense = self
            .ledger
            .record_expense(&entry)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CommandError::WalletNotFound(wallet.id),
                other => CommandError::Ledger(other),
            })?;

        info!(
            expense_id = %expense.id,
            wallet_id = %wallet.id,
            amount,
            kind = %cmd.kind,
            %category,
            "ledger entry recorded"
        );

        Ok(ExecutionResult {
            effect: ExecutionEffect::EntryRecorded { kind: cmd.kind },
            description,
            amount,
            category,
            created_id: expense.id,
        })
    }

    async fn create_budget(
        &self,
        user_id: Uuid,
        cmd: &BudgetCommand,
        today: NaiveDate,
    ) -> Result<ExecutionResult, CommandError> {
        let category = cmd
            .category
            .as_deref()
            .map(canonical_category)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CommandError::Validation("Danh mục không được để trống".to_string()))?;
        let limit = cmd.budget_limit.filter(|l| *l > 0).ok_or_else(|| {
            CommandError::Validation("Hạn mức ngân sách phải lớn hơn 0".to_string())
        })?;

        let current = BudgetPeriod::containing(today);
        let period = BudgetPeriod::new(
            cmd.month.unwrap_or(current.month),
            cmd.year.unwrap_or(current.year),
        )
        .ok_or_else(|| CommandError::Validation("Tháng không hợp lệ".to_string()))?;

        let upsert = self
            .ledger
            .upsert_budget(&user_id, &category, limit, period)
            .await?;

        info!(
            budget_id = %upsert.budget.id,
            created = upsert.created,
            %category,
            limit,
            month = period.month,
            year = period.year,
            "budget upserted"
        );

        Ok(ExecutionResult {
            effect: if upsert.created {
                ExecutionEffect::BudgetCreated
            } else {
                ExecutionEffect::BudgetUpdated
            },
            description: format!("Ngân sách {category}"),
            amount: limit,
            category,
            created_id: upsert.budget.id,
        })
    }
}

/// Explicit wallet, else the default wallet, else the first one.
fn resolve_wallet(wallets: &[Wallet], explicit: Option<Uuid>) -> Result<&Wallet, CommandError> {
    match explicit {
        Some(id) => wallets
            .iter()
            .find(|w| w.id == id)
            .ok_or(CommandError::WalletNotFound(id)),
        None => wallets
            .iter()
            .find(|w| w.is_default)
            .or_else(|| wallets.first())
            .ok_or(CommandError::NoWalletAvailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::testing::InMemoryLedger;
    use moneykeeper_types::ledger::EntryKind;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn expense(amount: Option<i64>, description: Option<&str>) -> ParsedCommand {
        ParsedCommand::CreateExpense(ExpenseCommand {
            amount,
            description: description.map(str::to_string),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_expense_uses_default_wallet_and_suggests_category() {
        let ledger = InMemoryLedger::default();
        let user = Uuid::now_v7();
        let first = ledger.add_wallet(user, "Tiền mặt", 100_000, false);
        let default = ledger.add_wallet(user, "Ngân hàng", 500_000, true);

        let result = CommandExecutor::new(&ledger)
            .execute(user, &expense(Some(20_000), Some("ăn sáng")), today())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.amount, 20_000);
        assert_eq!(result.category, "Ăn uống");
        assert_eq!(
            result.effect,
            ExecutionEffect::EntryRecorded {
                kind: EntryKind::Expense
            }
        );
        assert_eq!(ledger.balance(default), 480_000);
        assert_eq!(ledger.balance(first), 100_000);
        assert_eq!(ledger.expenses().len(), 1);
    }

    #[tokio::test]
    async fn test_income_adds_to_balance() {
        let ledger = InMemoryLedger::default();
        let user = Uuid::now_v7();
        let wallet = ledger.add_wallet(user, "Ví", 0, false);
        let cmd = ParsedCommand::CreateExpense(ExpenseCommand {
            amount: Some(10_000_000),
            description: Some("lương".to_string()),
            kind: EntryKind::Income,
            ..Default::default()
        });

        CommandExecutor::new(&ledger)
            .execute(user, &cmd, today())
            .await
            .unwrap();
        assert_eq!(ledger.balance(wallet), 10_000_000);
    }

    #[tokio::test]
    async fn test_expense_defaults_description() {
        let ledger = InMemoryLedger::default();
        let user = Uuid::now_v7();
        ledger.add_wallet(user, "Ví", 50_000, true);

        let result = CommandExecutor::new(&ledger)
            .execute(user, &expense(Some(5_000), None), today())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.description, DEFAULT_DESCRIPTION);
        assert_eq!(result.category, "Khác");
    }

    #[tokio::test]
    async fn test_invalid_amount_is_validation_error_without_writes() {
        let ledger = InMemoryLedger::default();
        let user = Uuid::now_v7();
        let wallet = ledger.add_wallet(user, "Ví", 50_000, true);

        for amount in [None, Some(0), Some(-5)] {
            let err = CommandExecutor::new(&ledger)
                .execute(user, &expense(amount, Some("x")), today())
                .await
                .unwrap_err();
            assert!(matches!(err, CommandError::Validation(_)));
        }
        assert!(ledger.expenses().is_empty());
        assert_eq!(ledger.balance(wallet), 50_000);
    }

    #[tokio::test]
    async fn test_no_wallet_available() {
        let ledger = InMemoryLedger::default();
        let err = CommandExecutor::new(&ledger)
            .execute(Uuid::now_v7(), &expense(Some(1_000), None), today())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NoWalletAvailable));
    }

    #[tokio::test]
    async fn test_foreign_wallet_is_rejected() {
        let ledger = InMemoryLedger::default();
        let owner = Uuid::now_v7();
        let intruder = Uuid::now_v7();
        let wallet = ledger.add_wallet(owner, "Ví", 50_000, true);
        ledger.add_wallet(intruder, "Ví của tôi", 10_000, true);

        let cmd = ParsedCommand::CreateExpense(ExpenseCommand {
            amount: Some(1_000),
            wallet_id: Some(wallet),
            ..Default::default()
        });
        let err = CommandExecutor::new(&ledger)
            .execute(intruder, &cmd, today())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::WalletNotFound(id) if id == wallet));
        assert_eq!(ledger.balance(wallet), 50_000);
    }

    #[tokio::test]
    async fn test_ledger_failure_surfaces_as_ledger_error() {
        let ledger = InMemoryLedger::default();
        let user = Uuid::now_v7();
        let wallet = ledger.add_wallet(user, "Ví", 50_000, true);
        ledger.fail_writes(true);

        let err = CommandExecutor::new(&ledger)
            .execute(user, &expense(Some(1_000), Some("bánh mì")), today())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Ledger(_)));
        assert_eq!(ledger.balance(wallet), 50_000);
        assert!(ledger.expenses().is_empty());
    }

    #[tokio::test]
    async fn test_budget_upsert_is_idempotent() {
        let ledger = InMemoryLedger::default();
        let user = Uuid::now_v7();
        let executor = CommandExecutor::new(&ledger);
        let cmd = |limit| {
            ParsedCommand::CreateBudget(BudgetCommand {
                category: Some("ăn uống".to_string()),
                budget_limit: Some(limit),
                month: None,
                year: None,
            })
        };

        let first = executor.execute(user, &cmd(3_000_000), today()).await.unwrap().unwrap();
        let second = executor.execute(user, &cmd(4_000_000), today()).await.unwrap().unwrap();

        assert_eq!(first.effect, ExecutionEffect::BudgetCreated);
        assert_eq!(second.effect, ExecutionEffect::BudgetUpdated);
        assert_eq!(first.created_id, second.created_id);
        assert_eq!(second.category, "Ăn uống");

        let budgets = ledger.budgets();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].amount_limit, 4_000_000);
        assert_eq!((budgets[0].month, budgets[0].year), (10, 2026));
    }

    #[tokio::test]
    async fn test_budget_validation() {
        let ledger = InMemoryLedger::default();
        let executor = CommandExecutor::new(&ledger);
        let user = Uuid::now_v7();

        let missing_category = ParsedCommand::CreateBudget(BudgetCommand {
            budget_limit: Some(1_000),
            ..Default::default()
        });
        let err = executor.execute(user, &missing_category, today()).await.unwrap_err();
        assert!(matches!(err, CommandError::Validation(ref m) if m.contains("Danh mục")));

        let bad_month = ParsedCommand::CreateBudget(BudgetCommand {
            category: Some("Ăn uống".to_string()),
            budget_limit: Some(1_000),
            month: Some(13),
            year: None,
        });
        let err = executor.execute(user, &bad_month, today()).await.unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
        assert!(ledger.budgets().is_empty());
    }

    #[tokio::test]
    async fn test_query_is_noop() {
        let ledger = InMemoryLedger::default();
        let result = CommandExecutor::new(&ledger)
            .execute(Uuid::now_v7(), &ParsedCommand::Query, today())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
