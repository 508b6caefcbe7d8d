//! Message pipeline: one inbound chat message in, one streamed reply out.
//!
//! intent parser (or extractor) -> executor -> direct answer -> context ->
//! prompt -> generator. The user message is stored before anything else and
//! exactly one assistant message is stored at the end, whatever happened in
//! between.

use std::pin::Pin;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures_util::Stream;
use moneykeeper_types::command::{CommandOrigin, ExecutionResult, ExpenseCommand, ParsedCommand};
use moneykeeper_types::config::GlobalConfig;
use moneykeeper_types::llm::Message;
use moneykeeper_types::persona::PersonaTag;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::context::ContextAssembler;
use super::direct_answer::balance_answer;
use super::executor::CommandExecutor;
use super::extractor::extract_expense;
use super::generator::{
    FragmentSink, GENERIC_APOLOGY, GenerationReport, ReplySource, ResponseGenerator,
};
use super::intent::IntentParser;
use super::keywords::{Topics, classify};
use super::persona::Persona;
use super::prompt::PromptBuilder;
use super::retry::RetryPolicy;
use crate::chat::repository::ChatRepository;
use crate::chat::service::ChatService;
use crate::ledger::repository::LedgerRepository;
use crate::llm::box_provider::BoxLlmProvider;

/// Reply fragments in order. Their concatenation is the full, non-empty reply.
pub type ReplyStream = Pin<Box<dyn Stream<Item = String> + Send>>;

const REPLY_CHANNEL_CAPACITY: usize = 32;

/// How a turn was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPath {
    /// The command failed validation or could not be saved.
    CommandRejected,
    DirectAnswer,
    Generated(ReplySource),
}

/// What one call to [`AssistantService::run`] did.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub reply: String,
    pub path: TurnPath,
    pub command: Option<(ParsedCommand, CommandOrigin)>,
    pub executed: Option<ExecutionResult>,
    pub generation: Option<GenerationReport>,
}

/// The conversational assistant. Built once at startup and shared behind an `Arc`.
pub struct AssistantService<L: LedgerRepository, C: ChatRepository> {
    ledger: L,
    chat: ChatService<C>,
    provider: BoxLlmProvider,
    config: GlobalConfig,
}

impl<L, C> AssistantService<L, C>
where
    L: LedgerRepository + 'static,
    C: ChatRepository + 'static,
{
    pub fn new(ledger: L, chat_repo: C, provider: BoxLlmProvider, config: GlobalConfig) -> Self {
        Self {
            ledger,
            chat: ChatService::new(chat_repo),
            provider,
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn chat(&self) -> &ChatService<C> {
        &self.chat
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Process `text` in a background task and stream the reply back.
    ///
    /// Dropping the stream does not cancel the turn: the task stops pulling
    /// the backend and still stores what was produced.
    pub fn handle_message(
        self: &Arc<Self>,
        session_id: Uuid,
        user_id: Uuid,
        persona: PersonaTag,
        text: String,
    ) -> ReplyStream {
        let (tx, rx) = mpsc::channel(REPLY_CHANNEL_CAPACITY);
        let this = Arc::clone(self);
        let span = info_span!(
            "assistant.turn",
            session_id = %session_id,
            user_id = %user_id,
            persona = %persona,
        );

        tokio::spawn(
            async move {
                let report = this
                    .run(session_id, user_id, persona, &text, FragmentSink::new(tx))
                    .await;
                info!(path = ?report.path, chars = report.reply.chars().count(), "turn finished");
            }
            .instrument(span),
        );

        Box::pin(ReceiverStream::new(rx))
    }

    /// Run one turn to completion, sending fragments to `sink`.
    pub async fn run(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        persona_tag: PersonaTag,
        text: &str,
        sink: FragmentSink,
    ) -> TurnReport {
        let persona = Persona::for_tag(persona_tag);
        let now = Utc::now();
        let today = now.date_naive();

        let history = self.load_history(&session_id).await;
        if let Err(e) = self.chat.save_user_message(session_id, text.to_string()).await {
            error!(error = %e, "failed to store user message");
        }

        let topics = classify(text);
        let command = self.resolve_command(text, topics, today).await;

        let mut executed = None;
        if let Some((cmd, origin)) = &command {
            info!(action = cmd.action_name(), %origin, "executing command");
            match CommandExecutor::new(&self.ledger).execute(user_id, cmd, today).await {
                Ok(result) => executed = result,
                Err(e) => {
                    warn!(error = %e, action = cmd.action_name(), "command rejected");
                    let reply = e.user_message();
                    sink.send(reply.clone()).await;
                    self.store_reply(session_id, &reply).await;
                    return TurnReport {
                        reply,
                        path: TurnPath::CommandRejected,
                        command,
                        executed: None,
                        generation: None,
                    };
                }
            }
        }

        if let Some(answer) = balance_answer(&self.ledger, user_id, topics).await {
            let reply = match &executed {
                Some(result) => format!("{}\n\n{answer}", persona.confirmation(result)),
                None => answer,
            };
            sink.send(reply.clone()).await;
            self.store_reply(session_id, &reply).await;
            return TurnReport {
                reply,
                path: TurnPath::DirectAnswer,
                command,
                executed,
                generation: None,
            };
        }

        let context = ContextAssembler::new(&self.ledger)
            .assemble(
                user_id,
                topics,
                executed.as_ref(),
                now,
                self.config.context.max_context_chars,
            )
            .await;
        let prompt = PromptBuilder::build(
            persona,
            &context,
            &history,
            text,
            self.config.context.max_prompt_chars,
        );

        let generic_reply = match &executed {
            Some(result) => persona.confirmation(result),
            None => GENERIC_APOLOGY.to_string(),
        };
        let generator = ResponseGenerator::new(
            &self.provider,
            &self.config.provider.model,
            self.config.generation,
            self.config.fallback,
            RetryPolicy::from(&self.config.retry),
        );
        let report = generator.generate(&prompt, text, &generic_reply, &sink).await;
        self.store_reply(session_id, &report.text).await;

        TurnReport {
            reply: report.text.clone(),
            path: TurnPath::Generated(report.source),
            command,
            executed,
            generation: Some(report),
        }
    }

    /// Intent model first, extractor second.
    ///
    /// A balance lookup with no amount in it never reaches the intent model.
    async fn resolve_command(
        &self,
        text: &str,
        topics: Topics,
        today: NaiveDate,
    ) -> Option<(ParsedCommand, CommandOrigin)> {
        let extracted = extract_expense(text);
        if topics.direct_balance && extracted.is_none() {
            debug!("lookup-only message, skipping intent parser");
            return None;
        }

        let parser = IntentParser::new(
            &self.provider,
            &self.config.provider.model,
            self.config.intent,
        );
        match parser.parse(text, today).await {
            Ok(Some(cmd)) => return Some((cmd, CommandOrigin::IntentModel)),
            Ok(None) => debug!("intent model found no command"),
            Err(e) => warn!(error = %e, "intent parsing failed, falling back to extractor"),
        }

        extracted.filter(|e| e.amount > 0).map(|e| {
            let cmd = ParsedCommand::CreateExpense(ExpenseCommand {
                amount: Some(e.amount),
                description: Some(e.description),
                ..Default::default()
            });
            (cmd, CommandOrigin::Extractor)
        })
    }

    async fn load_history(&self, session_id: &Uuid) -> Vec<Message> {
        match self
            .chat
            .history(session_id, self.config.context.history_limit)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "history unavailable, continuing without it");
                Vec::new()
            }
        }
    }

    async fn store_reply(&self, session_id: Uuid, reply: &str) {
        if let Err(e) = self
            .chat
            .save_assistant_message(session_id, reply.to_string())
            .await
        {
            error!(error = %e, "failed to store assistant message");
        }
    }
}
