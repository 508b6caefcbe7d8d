//! LlmProvider trait definition.
//!
//! `complete` uses RPITIT; `stream` returns a boxed stream so the trait can
//! be erased behind `BoxLlmProvider`.

use std::pin::Pin;

use futures_util::Stream;

use moneykeeper_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StreamEvent,
};

/// Stream of events from a streaming completion.
pub type LlmEventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for text-generation backends.
///
/// Implementations live in moneykeeper-infra (`OpenAiCompatibleProvider`,
/// which also serves Gemini through its OpenAI endpoint). A content-filter
/// refusal must surface as `LlmError::SafetyBlocked`, both from `complete`
/// and as an item of the `stream`.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;

    /// Send a streaming completion request. Returns a stream of events.
    fn stream(&self, request: CompletionRequest) -> LlmEventStream;
}
