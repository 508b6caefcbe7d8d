//! Streaming response generator.
//!
//! Drives the backend in streaming mode and forwards every text fragment as
//! soon as it arrives. Recovery, in order:
//!
//! 1. Transient error after some text: keep the partial reply.
//! 2. Transient error before any text: retry the stream with exponential
//!    backoff, up to `RetryPolicy::max_retries` extra attempts.
//! 3. Safety block: never retried, the fixed apology is the reply.
//! 4. Streams exhausted, fatal error or empty output: one non-streaming call
//!    with a short prompt.
//! 5. Still nothing: the caller-supplied generic reply.
//!
//! The returned text is always non-empty and equals the concatenation of
//! every fragment handed to the sink.

use std::time::Duration;

use futures_util::StreamExt;
use moneykeeper_types::llm::{
    CompletionRequest, GenerationFailure, LlmError, SamplingConfig, StopReason, StreamEvent,
};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, warn};

use super::prompt::PromptBuilder;
use super::retry::RetryPolicy;
use crate::llm::box_provider::BoxLlmProvider;

pub const SAFETY_APOLOGY: &str = "Xin lỗi, tôi không thể trả lời câu hỏi này do bị chặn bởi bộ lọc an toàn. Bạn có thể diễn đạt lại câu hỏi được không?";

pub const GENERIC_APOLOGY: &str =
    "Xin lỗi, tôi gặp một chút khó khăn. Bạn có thể nhắc lại câu hỏi được không?";

/// Where the final reply text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Streamed,
    /// A stream broke after producing text; that text is the reply.
    Partial,
    Fallback,
    SafetyApology,
    /// The generic reply passed in by the caller.
    Generic,
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub text: String,
    pub source: ReplySource,
    pub stream_attempts: u32,
    pub backoff_waits: Vec<Duration>,
    /// The receiving side went away before the reply was complete.
    pub disconnected: bool,
}

/// Receiving end of the reply fragments.
#[derive(Debug, Clone)]
pub struct FragmentSink {
    tx: mpsc::Sender<String>,
}

impl FragmentSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// `false` once the receiver has been dropped.
    pub async fn send(&self, fragment: String) -> bool {
        self.tx.send(fragment).await.is_ok()
    }
}

/// How a single streaming attempt ended.
enum StreamOutcome {
    Ended,
    Failed(LlmError),
    Disconnected,
}

/// Accumulates what has been forwarded so far.
struct Reply<'s> {
    text: String,
    sink: &'s FragmentSink,
    connected: bool,
}

impl Reply<'_> {
    async fn emit(&mut self, fragment: String) -> bool {
        self.text.push_str(&fragment);
        if self.connected {
            self.connected = self.sink.send(fragment).await;
        }
        self.connected
    }

    fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

pub struct ResponseGenerator<'a> {
    provider: &'a BoxLlmProvider,
    model: &'a str,
    generation: SamplingConfig,
    fallback: SamplingConfig,
    retry: RetryPolicy,
}

impl<'a> ResponseGenerator<'a> {
    pub fn new(
        provider: &'a BoxLlmProvider,
        model: &'a str,
        generation: SamplingConfig,
        fallback: SamplingConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            model,
            generation,
            fallback,
            retry,
        }
    }

    /// Produce the reply for `prompt`, forwarding fragments to `sink`.
    ///
    /// `message` is the raw user message, used for the fallback prompt.
    /// `generic_reply` is the last resort when nothing could be generated.
    pub async fn generate(
        &self,
        prompt: &str,
        message: &str,
        generic_reply: &str,
        sink: &FragmentSink,
    ) -> GenerationReport {
        let mut reply = Reply {
            text: String::new(),
            sink,
            connected: true,
        };
        let mut attempt = 0u32;
        let mut waits = Vec::new();

        let source = loop {
            attempt += 1;
            match self.stream_once(prompt, attempt, &mut reply).await {
                StreamOutcome::Ended if reply.has_text() => break Some(ReplySource::Streamed),
                StreamOutcome::Ended => {
                    warn!(attempt, "stream ended without text");
                    break None;
                }
                StreamOutcome::Disconnected => {
                    info!(attempt, "receiver disconnected, stopping generation");
                    if reply.has_text() {
                        break Some(ReplySource::Partial);
                    }
                    reply.emit(generic_reply.to_string()).await;
                    break Some(ReplySource::Generic);
                }
                StreamOutcome::Failed(err) => match err.failure_kind() {
                    GenerationFailure::SafetyBlock => {
                        warn!(attempt, error = %err, "stream blocked by safety filter");
                        emit_safety_apology(&mut reply).await;
                        break Some(ReplySource::SafetyApology);
                    }
                    _ if reply.has_text() => {
                        warn!(attempt, error = %err, "stream broke after partial output, keeping it");
                        break Some(ReplySource::Partial);
                    }
                    _ if self.retry.should_retry(attempt, &err) => {
                        let wait = self.retry.backoff(attempt, &err);
                        warn!(
                            attempt,
                            wait_ms = wait.as_millis() as u64,
                            error = %err,
                            "stream failed, retrying"
                        );
                        waits.push(wait);
                        tokio::time::sleep(wait).await;
                    }
                    kind => {
                        warn!(attempt, ?kind, error = %err, "giving up on streaming");
                        break None;
                    }
                },
            }
        };

        let source = match source {
            Some(source) => source,
            None => self.fallback_reply(message, generic_reply, &mut reply).await,
        };

        GenerationReport {
            text: reply.text,
            source,
            stream_attempts: attempt,
            backoff_waits: waits,
            disconnected: !reply.connected,
        }
    }

    async fn stream_once(&self, prompt: &str, attempt: u32, reply: &mut Reply<'_>) -> StreamOutcome {
        let request = CompletionRequest::from_prompt(self.model, prompt, &self.generation, true);
        let span = info_span!(
            "gen_ai.stream",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            attempt,
        );

        async move {
            let mut stream = self.provider.stream(request);
            while let Some(event) = stream.next().await {
                match event {
                    Ok(StreamEvent::TextDelta { text }) => {
                        if text.is_empty() {
                            continue;
                        }
                        if !reply.emit(text).await {
                            return StreamOutcome::Disconnected;
                        }
                    }
                    Ok(StreamEvent::MessageDelta {
                        stop_reason: StopReason::ContentFilter,
                    }) => {
                        return StreamOutcome::Failed(LlmError::SafetyBlocked {
                            reason: StopReason::ContentFilter.to_string(),
                        });
                    }
                    Ok(StreamEvent::Usage(usage)) => {
                        debug!(
                            input_tokens = usage.input_tokens,
                            output_tokens = usage.output_tokens,
                            "stream usage"
                        );
                    }
                    Ok(StreamEvent::Done) => break,
                    Ok(_) => {}
                    Err(err) => return StreamOutcome::Failed(err),
                }
            }
            StreamOutcome::Ended
        }
        .instrument(span)
        .await
    }

    /// Single non-streaming call with the short prompt, then the generic reply.
    async fn fallback_reply(
        &self,
        message: &str,
        generic_reply: &str,
        reply: &mut Reply<'_>,
    ) -> ReplySource {
        let request = CompletionRequest::from_prompt(
            self.model,
            PromptBuilder::fallback_prompt(message),
            &self.fallback,
            false,
        );
        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = false,
        );

        match self.provider.complete(&request).instrument(span).await {
            Ok(response) if !response.content.trim().is_empty() => {
                info!("fallback generation succeeded");
                reply.emit(response.content).await;
                ReplySource::Fallback
            }
            Ok(_) => {
                warn!("fallback generation returned no text");
                reply.emit(generic_reply.to_string()).await;
                ReplySource::Generic
            }
            Err(err) if err.failure_kind() == GenerationFailure::SafetyBlock => {
                warn!(error = %err, "fallback blocked by safety filter");
                emit_safety_apology(reply).await;
                ReplySource::SafetyApology
            }
            Err(err) => {
                warn!(error = %err, "fallback generation failed");
                reply.emit(generic_reply.to_string()).await;
                ReplySource::Generic
            }
        }
    }
}

async fn emit_safety_apology(reply: &mut Reply<'_>) {
    let fragment = if reply.has_text() {
        format!("\n\n{SAFETY_APOLOGY}")
    } else {
        SAFETY_APOLOGY.to_string()
    };
    reply.emit(fragment).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::testing::{MockProvider, Scripted};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base: Duration::from_millis(1),
            max: Duration::from_millis(50),
        }
    }

    fn generator(provider: &BoxLlmProvider) -> ResponseGenerator<'_> {
        ResponseGenerator::new(
            provider,
            "test-model",
            SamplingConfig {
                temperature: 0.7,
                max_output_tokens: 2048,
            },
            SamplingConfig {
                temperature: 0.7,
                max_output_tokens: 256,
            },
            fast_retry(),
        )
    }

    /// Run the generator and collect everything the sink received.
    async fn run(provider: &BoxLlmProvider) -> (GenerationReport, Vec<String>) {
        let (tx, mut rx) = mpsc::channel(64);
        let sink = FragmentSink::new(tx);
        let report = generator(provider)
            .generate("PROMPT", "câu hỏi", GENERIC_APOLOGY, &sink)
            .await;
        drop(sink);
        let mut fragments = Vec::new();
        while let Some(f) = rx.recv().await {
            fragments.push(f);
        }
        (report, fragments)
    }

    fn transient() -> LlmError {
        LlmError::Stream("connection reset".to_string())
    }

    #[tokio::test]
    async fn test_stream_ok_forwards_every_fragment() {
        let provider = MockProvider::boxed(vec![Scripted::Stream(vec![
            Ok("Chào "),
            Ok("bạn"),
            Ok("!"),
        ])]);
        let (report, fragments) = run(&provider).await;

        assert_eq!(report.source, ReplySource::Streamed);
        assert_eq!(report.text, "Chào bạn!");
        assert_eq!(fragments, vec!["Chào ", "bạn", "!"]);
        assert_eq!(report.stream_attempts, 1);
        assert!(report.backoff_waits.is_empty());
    }

    #[tokio::test]
    async fn test_two_transient_failures_then_success() {
        let provider = MockProvider::boxed(vec![
            Scripted::Stream(vec![Err(transient())]),
            Scripted::Stream(vec![Err(LlmError::Timeout)]),
            Scripted::Stream(vec![Ok("Xin "), Ok("chào")]),
        ]);
        let (report, fragments) = run(&provider).await;

        assert_eq!(report.source, ReplySource::Streamed);
        assert_eq!(report.text, "Xin chào");
        assert_eq!(fragments.concat(), "Xin chào");
        assert_eq!(report.stream_attempts, 3);
        assert_eq!(
            report.backoff_waits,
            vec![Duration::from_millis(2), Duration::from_millis(4)]
        );
    }

    #[tokio::test]
    async fn test_safety_block_is_not_retried() {
        let mock = MockProvider::new(vec![Scripted::Stream(vec![Err(LlmError::SafetyBlocked {
            reason: "SAFETY".to_string(),
        })])]);
        let requests = mock.requests();
        let provider = BoxLlmProvider::new(mock);
        let (report, fragments) = run(&provider).await;

        assert_eq!(report.source, ReplySource::SafetyApology);
        assert_eq!(report.text, SAFETY_APOLOGY);
        assert_eq!(fragments, vec![SAFETY_APOLOGY]);
        assert!(report.backoff_waits.is_empty());
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_safety_block_after_partial_appends_apology() {
        let provider = MockProvider::boxed(vec![Scripted::Stream(vec![
            Ok("Về việc này"),
            Err(LlmError::SafetyBlocked {
                reason: "SAFETY".to_string(),
            }),
        ])]);
        let (report, fragments) = run(&provider).await;

        assert_eq!(report.source, ReplySource::SafetyApology);
        assert_eq!(report.text, format!("Về việc này\n\n{SAFETY_APOLOGY}"));
        assert_eq!(fragments.concat(), report.text);
    }

    #[tokio::test]
    async fn test_partial_text_is_kept_on_transient_break() {
        let mock = MockProvider::new(vec![Scripted::Stream(vec![
            Ok("Bạn đã chi "),
            Ok("120,000đ"),
            Err(transient()),
        ])]);
        let requests = mock.requests();
        let provider = BoxLlmProvider::new(mock);
        let (report, _) = run(&provider).await;

        assert_eq!(report.source, ReplySource::Partial);
        assert_eq!(report.text, "Bạn đã chi 120,000đ");
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_streams_fall_back_to_single_shot() {
        let mock = MockProvider::new(vec![
            Scripted::Stream(vec![Err(transient())]),
            Scripted::Stream(vec![Err(transient())]),
            Scripted::Stream(vec![Err(transient())]),
            Scripted::Complete("Trả lời ngắn.".to_string()),
        ]);
        let requests = mock.requests();
        let provider = BoxLlmProvider::new(mock);
        let (report, fragments) = run(&provider).await;

        assert_eq!(report.source, ReplySource::Fallback);
        assert_eq!(report.text, "Trả lời ngắn.");
        assert_eq!(fragments, vec!["Trả lời ngắn."]);
        assert_eq!(report.stream_attempts, 3);
        assert_eq!(report.backoff_waits.len(), 2);

        let seen = requests.lock().unwrap();
        assert_eq!(seen.len(), 4);
        let fallback = &seen[3];
        assert!(!fallback.stream);
        assert_eq!(fallback.max_tokens, 256);
        assert_eq!(
            fallback.messages[0].content,
            PromptBuilder::fallback_prompt("câu hỏi")
        );
    }

    #[tokio::test]
    async fn test_total_failure_yields_generic_reply() {
        let provider = MockProvider::boxed(vec![]);
        let (report, fragments) = run(&provider).await;

        assert_eq!(report.source, ReplySource::Generic);
        assert_eq!(report.text, GENERIC_APOLOGY);
        assert_eq!(fragments, vec![GENERIC_APOLOGY]);
    }

    #[tokio::test]
    async fn test_empty_stream_goes_to_fallback() {
        let provider = MockProvider::boxed(vec![
            Scripted::Stream(vec![]),
            Scripted::Complete("Có đây.".to_string()),
        ]);
        let (report, _) = run(&provider).await;
        assert_eq!(report.source, ReplySource::Fallback);
        assert_eq!(report.stream_attempts, 1);
    }

    #[tokio::test]
    async fn test_fatal_error_skips_stream_retries() {
        let provider = MockProvider::boxed(vec![
            Scripted::CompleteErr(LlmError::AuthenticationFailed),
            Scripted::Complete("   ".to_string()),
        ]);
        let (report, _) = run(&provider).await;

        assert_eq!(report.stream_attempts, 1);
        assert!(report.backoff_waits.is_empty());
        assert_eq!(report.source, ReplySource::Generic);
        assert_eq!(report.text, GENERIC_APOLOGY);
    }

    #[tokio::test]
    async fn test_disconnect_stops_pulling_and_keeps_text() {
        let mock = MockProvider::new(vec![Scripted::Stream(vec![Ok("một"), Ok("hai")])]);
        let requests = mock.requests();
        let provider = BoxLlmProvider::new(mock);
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let sink = FragmentSink::new(tx);

        let report = generator(&provider)
            .generate("PROMPT", "câu hỏi", GENERIC_APOLOGY, &sink)
            .await;

        assert!(report.disconnected);
        assert_eq!(report.source, ReplySource::Partial);
        assert_eq!(report.text, "một");
        assert_eq!(requests.lock().unwrap().len(), 1);
    }
}
