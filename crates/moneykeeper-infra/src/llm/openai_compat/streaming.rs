//! OpenAI SSE stream to [`StreamEvent`] adapter.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] to the
//! provider-agnostic events from `moneykeeper-types`. A `content_filter`
//! finish reason ends the stream with [`LlmError::SafetyBlocked`], after any
//! text that was already produced.

use futures_util::StreamExt;

use async_openai::types::chat::{ChatCompletionResponseStream, FinishReason};

use moneykeeper_core::llm::provider::LlmEventStream;
use moneykeeper_types::llm::{LlmError, StopReason, StreamEvent, Usage};

/// Map an async-openai [`ChatCompletionResponseStream`] to a stream of [`StreamEvent`]s.
///
/// Order: `Connected`, then `TextDelta`s, `MessageDelta` when a finish
/// reason appears, `Usage` (sent in the final chunk when
/// `stream_options.include_usage` is set), and `Done`.
pub fn map_openai_stream(stream: ChatCompletionResponseStream) -> LlmEventStream {
    Box::pin(async_stream::try_stream! {
        yield StreamEvent::Connected;

        let mut stream = stream;

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(super::map_openai_error)?;

            if let Some(usage) = chunk.usage.as_ref() {
                yield StreamEvent::Usage(Usage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                });
            }

            for choice in &chunk.choices {
                if let Some(text) = choice.delta.content.as_ref() {
                    if !text.is_empty() {
                        yield StreamEvent::TextDelta { text: text.clone() };
                    }
                }

                if let Some(finish_reason) = choice.finish_reason.as_ref() {
                    let stop_reason = stop_reason(finish_reason);
                    if stop_reason == StopReason::ContentFilter {
                        Err(LlmError::SafetyBlocked {
                            reason: "content_filter".to_string(),
                        })?;
                    }
                    yield StreamEvent::MessageDelta { stop_reason };
                }
            }
        }

        yield StreamEvent::Done;
    })
}

/// Tool and function calls are never requested, so they read as a normal end.
pub(crate) fn stop_reason(finish_reason: &FinishReason) -> StopReason {
    match finish_reason {
        FinishReason::Stop => StopReason::EndTurn,
        FinishReason::Length => StopReason::MaxTokens,
        FinishReason::ContentFilter => StopReason::ContentFilter,
        FinishReason::ToolCalls | FinishReason::FunctionCall => StopReason::EndTurn,
    }
}
