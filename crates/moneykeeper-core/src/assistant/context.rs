//! Context assembler: a short digest of the user's own ledger data for the
//! APP_CONTEXT block of the prompt.
//!
//! Each matched topic adds at most one sentence. A topic with no data, or
//! whose ledger read fails, adds nothing.

use chrono::{DateTime, Duration, Utc};
use moneykeeper_types::command::{ExecutionEffect, ExecutionResult};
use moneykeeper_types::ledger::{BudgetPeriod, EntryKind};
use tracing::warn;
use uuid::Uuid;

use super::format::format_currency;
use super::keywords::Topics;
use crate::ledger::repository::LedgerRepository;

const MAX_WALLETS: usize = 5;
const MAX_CATEGORIES: usize = 6;
const MAX_BUDGETS: usize = 6;
const SPEND_WINDOW_DAYS: i64 = 30;

pub struct ContextAssembler<'a, L: LedgerRepository> {
    ledger: &'a L,
}

impl<'a, L: LedgerRepository> ContextAssembler<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Execution note (if any) followed by one sentence per matched topic,
    /// space-joined and cut to `max_chars` characters.
    pub async fn assemble(
        &self,
        user_id: Uuid,
        topics: Topics,
        executed: Option<&ExecutionResult>,
        now: DateTime<Utc>,
        max_chars: usize,
    ) -> String {
        let mut sentences = Vec::new();
        if let Some(result) = executed {
            sentences.push(execution_note(result));
        }
        if topics.balance {
            sentences.extend(self.wallet_sentence(user_id).await);
        }
        if topics.spending {
            sentences.extend(self.spending_sentence(user_id, now).await);
        }
        if topics.budgets {
            sentences.extend(self.budget_sentence(user_id, now).await);
        }
        truncate_chars(&sentences.join(" "), max_chars)
    }

    async fn wallet_sentence(&self, user_id: Uuid) -> Option<String> {
        let wallets = match self.ledger.list_wallets(&user_id).await {
            Ok(w) => w,
            Err(e) => {
                warn!(error = %e, "wallet context unavailable");
                return None;
            }
        };
        if wallets.is_empty() {
            return None;
        }

        let total: i64 = wallets.iter().map(|w| w.balance).sum();
        let mut parts: Vec<String> = wallets
            .iter()
            .take(MAX_WALLETS)
            .map(|w| format!("{}: {}", w.name, format_currency(w.balance)))
            .collect();
        if wallets.len() > MAX_WALLETS {
            parts.push("...".to_string());
        }
        Some(format!(
            "Số dư ví: {}. Tổng: {}.",
            parts.join(", "),
            format_currency(total)
        ))
    }

    async fn spending_sentence(&self, user_id: Uuid, now: DateTime<Utc>) -> Option<String> {
        let since = now - Duration::days(SPEND_WINDOW_DAYS);
        let totals = match self.ledger.spend_by_category_since(&user_id, since).await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "spending context unavailable");
                return None;
            }
        };
        if totals.is_empty() {
            return None;
        }

        let parts: Vec<String> = totals
            .iter()
            .take(MAX_CATEGORIES)
            .map(|c| format!("{}: {}", c.category, format_currency(c.total)))
            .collect();
        Some(format!(
            "Chi tiêu {SPEND_WINDOW_DAYS} ngày gần đây theo danh mục: {}.",
            parts.join(", ")
        ))
    }

    async fn budget_sentence(&self, user_id: Uuid, now: DateTime<Utc>) -> Option<String> {
        let period = BudgetPeriod::containing(now.date_naive());
        let budgets = match self.ledger.budgets_for_period(&user_id, period).await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "budget context unavailable");
                return None;
            }
        };
        if budgets.is_empty() {
            return None;
        }

        let (start, end) = period.bounds();
        let mut parts = Vec::new();
        for budget in budgets.iter().take(MAX_BUDGETS) {
            let spent = match self
                .ledger
                .spent_in_period(&user_id, &budget.category, start, end)
                .await
            {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, category = %budget.category, "budget spend unavailable");
                    continue;
                }
            };
            let percent = if budget.amount_limit > 0 {
                spent.saturating_mul(100) / budget.amount_limit
            } else {
                0
            };
            parts.push(format!(
                "{}: {}/{} ({percent}%)",
                budget.category,
                format_currency(spent),
                format_currency(budget.amount_limit)
            ));
        }
        if parts.is_empty() {
            return None;
        }
        Some(format!("Ngân sách tháng hiện tại: {}.", parts.join("; ")))
    }
}

/// One sentence telling the model what the pipeline just did.
pub fn execution_note(result: &ExecutionResult) -> String {
    let amount = format_currency(result.amount);
    match result.effect {
        ExecutionEffect::EntryRecorded {
            kind: EntryKind::Expense,
        } => format!(
            "Người dùng vừa chi tiêu {amount} cho {} (danh mục: {}).",
            result.description, result.category
        ),
        ExecutionEffect::EntryRecorded {
            kind: EntryKind::Income,
        } => format!(
            "Người dùng vừa ghi nhận khoản thu {amount} từ {} (danh mục: {}).",
            result.description, result.category
        ),
        ExecutionEffect::BudgetCreated => format!(
            "Người dùng vừa tạo ngân sách {} với hạn mức {amount}.",
            result.category
        ),
        ExecutionEffect::BudgetUpdated => format!(
            "Người dùng vừa cập nhật ngân sách {} với hạn mức {amount}.",
            result.category
        ),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
