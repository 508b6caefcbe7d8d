//! In-memory doubles for the assistant tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use moneykeeper_types::chat::{ChatMessage, ChatSession};
use moneykeeper_types::error::RepositoryError;
use moneykeeper_types::ledger::{
    Budget, BudgetPeriod, BudgetUpsert, CategorySpend, EntryKind, Expense, NewExpense, Wallet,
};
use moneykeeper_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason,
    StreamEvent, Usage,
};
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::ledger::repository::LedgerRepository;
use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::provider::{LlmEventStream, LlmProvider};

// --- Provider ---

/// One scripted backend call, consumed in order.
pub(crate) enum Scripted {
    Complete(String),
    CompleteErr(LlmError),
    /// Text fragments, optionally ending in an error. Without an error the
    /// stream finishes cleanly.
    Stream(Vec<Result<&'static str, LlmError>>),
}

/// Provider that replays a script. Once the script runs out every call fails
/// with a transient provider error, like an unreachable backend.
pub(crate) struct MockProvider {
    script: Mutex<VecDeque<Scripted>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    capabilities: ProviderCapabilities,
}

impl MockProvider {
    pub(crate) fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
            capabilities: ProviderCapabilities {
                streaming: true,
                max_context_tokens: 32_000,
                max_output_tokens: 2048,
            },
        }
    }

    pub(crate) fn boxed(script: Vec<Scripted>) -> BoxLlmProvider {
        BoxLlmProvider::new(Self::new(script))
    }

    /// Every request the provider has seen, streaming or not.
    pub(crate) fn requests(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        Arc::clone(&self.requests)
    }

    fn next(&self, request: &CompletionRequest) -> Option<Scripted> {
        self.requests.lock().unwrap().push(request.clone());
        self.script.lock().unwrap().pop_front()
    }
}

fn unreachable_backend() -> LlmError {
    LlmError::Provider {
        message: "connection refused".to_string(),
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        let step = self.next(request);
        let model = request.model.clone();
        async move {
            match step {
                Some(Scripted::Complete(content)) => Ok(CompletionResponse {
                    id: "resp-mock".to_string(),
                    content,
                    model,
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::default(),
                }),
                Some(Scripted::CompleteErr(err)) => Err(err),
                Some(Scripted::Stream(_)) | None => Err(unreachable_backend()),
            }
        }
    }

    fn stream(&self, request: CompletionRequest) -> LlmEventStream {
        let step = self.next(&request);
        Box::pin(async_stream::stream! {
            match step {
                Some(Scripted::Stream(items)) => {
                    yield Ok(StreamEvent::Connected);
                    let mut failed = false;
                    for item in items {
                        match item {
                            Ok(text) => yield Ok(StreamEvent::TextDelta { text: text.to_string() }),
                            Err(err) => {
                                failed = true;
                                yield Err(err);
                                break;
                            }
                        }
                    }
                    if !failed {
                        yield Ok(StreamEvent::MessageDelta { stop_reason: StopReason::EndTurn });
                        yield Ok(StreamEvent::Done);
                    }
                }
                Some(Scripted::CompleteErr(err)) => yield Err(err),
                Some(Scripted::Complete(_)) | None => yield Err(unreachable_backend()),
            }
        })
    }
}

// --- Chat store ---

#[derive(Default)]
struct ChatState {
    sessions: Vec<ChatSession>,
    messages: Vec<ChatMessage>,
}

/// Chat repository over a shared `Vec`. Clones see the same data.
#[derive(Clone, Default)]
pub(crate) struct InMemoryChatRepository {
    state: Arc<Mutex<ChatState>>,
}

impl InMemoryChatRepository {
    pub(crate) fn messages(&self, session_id: &Uuid) -> Vec<ChatMessage> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.session_id == *session_id)
            .cloned()
            .collect()
    }
}

impl ChatRepository for InMemoryChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        self.state.lock().unwrap().sessions.push(session.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.sessions.iter().find(|s| s.id == *session_id).cloned())
    }

    async fn latest_session(&self, user_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .iter()
            .filter(|s| s.user_id == *user_id)
            .max_by_key(|s| s.updated_at)
            .cloned())
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(session) = state.sessions.iter_mut().find(|s| s.id == message.session_id) {
            session.updated_at = message.created_at;
        }
        state.messages.push(message.clone());
        Ok(())
    }

    async fn recent_messages(
        &self,
        session_id: &Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let all = self.messages(session_id);
        let skip = match limit {
            Some(limit) => all.len().saturating_sub(limit as usize),
            None => 0,
        };
        Ok(all.into_iter().skip(skip).collect())
    }
}

// --- Ledger ---

#[derive(Default)]
struct LedgerState {
    wallets: Vec<Wallet>,
    expenses: Vec<Expense>,
    budgets: Vec<Budget>,
}

/// Ledger over shared `Vec`s with switchable failures.
#[derive(Clone, Default)]
pub(crate) struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
}

impl InMemoryLedger {
    pub(crate) fn add_wallet(&self, user_id: Uuid, name: &str, balance: i64, is_default: bool) -> Uuid {
        let id = Uuid::now_v7();
        self.state.lock().unwrap().wallets.push(Wallet {
            id,
            user_id,
            name: name.to_string(),
            balance,
            currency: "VND".to_string(),
            is_default,
            created_at: Utc::now(),
        });
        id
    }

    /// Insert an entry without touching balances.
    pub(crate) fn add_expense(
        &self,
        user_id: Uuid,
        category: &str,
        amount: i64,
        kind: EntryKind,
        occurred_at: DateTime<Utc>,
    ) {
        self.state.lock().unwrap().expenses.push(Expense {
            id: Uuid::now_v7(),
            user_id,
            wallet_id: Uuid::nil(),
            amount,
            category: category.to_string(),
            description: String::new(),
            kind,
            occurred_at,
        });
    }

    pub(crate) fn add_budget(&self, user_id: Uuid, category: &str, amount_limit: i64, period: BudgetPeriod) {
        self.state.lock().unwrap().budgets.push(Budget {
            id: Uuid::now_v7(),
            user_id,
            category: category.to_string(),
            amount_limit,
            month: period.month,
            year: period.year,
        });
    }

    pub(crate) fn balance(&self, wallet_id: Uuid) -> i64 {
        self.state
            .lock()
            .unwrap()
            .wallets
            .iter()
            .find(|w| w.id == wallet_id)
            .map(|w| w.balance)
            .unwrap()
    }

    pub(crate) fn expenses(&self) -> Vec<Expense> {
        self.state.lock().unwrap().expenses.clone()
    }

    pub(crate) fn budgets(&self) -> Vec<Budget> {
        self.state.lock().unwrap().budgets.clone()
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Connection);
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        Ok(())
    }
}

impl LedgerRepository for InMemoryLedger {
    async fn list_wallets(&self, user_id: &Uuid) -> Result<Vec<Wallet>, RepositoryError> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .wallets
            .iter()
            .filter(|w| w.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn record_expense(&self, entry: &NewExpense) -> Result<Expense, RepositoryError> {
        self.check_writes()?;
        let mut state = self.state.lock().unwrap();
        let wallet = state
            .wallets
            .iter_mut()
            .find(|w| w.id == entry.wallet_id && w.user_id == entry.user_id)
            .ok_or(RepositoryError::NotFound)?;
        wallet.balance += entry.kind.balance_delta(entry.amount);

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
        state.expenses.push(expense.clone());
        Ok(expense)
    }

    async fn upsert_budget(
        &self,
        user_id: &Uuid,
        category: &str,
        amount_limit: i64,
        period: BudgetPeriod,
    ) -> Result<BudgetUpsert, RepositoryError> {
        self.check_writes()?;
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.budgets.iter_mut().find(|b| {
            b.user_id == *user_id
                && b.category == category
                && b.month == period.month
                && b.year == period.year
        }) {
            existing.amount_limit = amount_limit;
            return Ok(BudgetUpsert {
                budget: existing.clone(),
                created: false,
            });
        }
        let budget = Budget {
            id: Uuid::now_v7(),
            user_id: *user_id,
            category: category.to_string(),
            amount_limit,
            month: period.month,
            year: period.year,
        };
        state.budgets.push(budget.clone());
        Ok(BudgetUpsert {
            budget,
            created: true,
        })
    }

    async fn budgets_for_period(
        &self,
        user_id: &Uuid,
        period: BudgetPeriod,
    ) -> Result<Vec<Budget>, RepositoryError> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .budgets
            .iter()
            .filter(|b| b.user_id == *user_id && b.month == period.month && b.year == period.year)
            .cloned()
            .collect())
    }

    async fn spend_by_category_since(
        &self,
        user_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<CategorySpend>, RepositoryError> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        let mut totals: Vec<CategorySpend> = Vec::new();
        for e in state.expenses.iter().filter(|e| {
            e.user_id == *user_id && e.kind == EntryKind::Expense && e.occurred_at >= since
        }) {
            match totals.iter_mut().find(|t| t.category == e.category) {
                Some(t) => t.total += e.amount,
                None => totals.push(CategorySpend {
                    category: e.category.clone(),
                    total: e.amount,
                }),
            }
        }
        totals.sort_by(|a, b| b.total.cmp(&a.total));
        Ok(totals)
    }

    async fn spent_in_period(
        &self,
        user_id: &Uuid,
        category: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .expenses
            .iter()
            .filter(|e| {
                e.user_id == *user_id
                    && e.kind == EntryKind::Expense
                    && e.category == category
                    && e.occurred_at >= start
                    && e.occurred_at < end
            })
            .map(|e| e.amount)
            .sum())
    }
}
