//! Commands recognized in a user message and the outcome of executing them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::EntryKind;

/// A ledger command, either produced by the intent model or synthesized
/// by the free-text extractor.
///
/// "No command" is `Option::None` at the call sites, never a variant here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ParsedCommand {
    CreateExpense(ExpenseCommand),
    CreateBudget(BudgetCommand),
    /// The user asked a question; nothing to execute.
    Query,
}

impl ParsedCommand {
    pub fn action_name(&self) -> &'static str {
        match self {
            ParsedCommand::CreateExpense(_) => "create_expense",
            ParsedCommand::CreateBudget(_) => "create_budget",
            ParsedCommand::Query => "query",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCommand {
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub wallet_id: Option<Uuid>,
    #[serde(default)]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetCommand {
    pub category: Option<String>,
    pub budget_limit: Option<i64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Where a command came from. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    IntentModel,
    Extractor,
}

impl std::fmt::Display for CommandOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandOrigin::IntentModel => write!(f, "intent_model"),
            CommandOrigin::Extractor => write!(f, "extractor"),
        }
    }
}

/// What an executed command changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionEffect {
    EntryRecorded { kind: EntryKind },
    BudgetCreated,
    BudgetUpdated,
}

/// Summary of a successful command, fed back into the reply context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub effect: ExecutionEffect,
    pub description: String,
    pub amount: i64,
    pub category: String,
    pub created_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_name() {
        assert_eq!(
            ParsedCommand::CreateExpense(ExpenseCommand::default()).action_name(),
            "create_expense"
        );
        assert_eq!(
            ParsedCommand::CreateBudget(BudgetCommand::default()).action_name(),
            "create_budget"
        );
        assert_eq!(ParsedCommand::Query.action_name(), "query");
    }

    #[test]
    fn test_expense_command_defaults_to_expense_kind() {
        let cmd = ExpenseCommand::default();
        assert_eq!(cmd.kind, EntryKind::Expense);
        assert!(cmd.amount.is_none());
    }
}
