//! LLM wire types shared between the assistant pipeline and provider adapters.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Role of a message author in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "system" => Ok(MessageRole::System),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single turn sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters for one kind of model call.
///
/// The pipeline uses three of these: the streamed reply, intent parsing
/// and the single-shot fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

/// A completion request.
///
/// The assistant always sends a single rendered prompt as one user message;
/// `system` stays available for providers that want it split out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub stream: bool,
}

impl CompletionRequest {
    /// Build a request carrying `prompt` as the only user message.
    pub fn from_prompt(
        model: impl Into<String>,
        prompt: impl Into<String>,
        sampling: &SamplingConfig,
        stream: bool,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(prompt)],
            system: None,
            max_tokens: sampling.max_output_tokens,
            temperature: Some(sampling.temperature),
            stream,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ContentFilter,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::StopSequence => write!(f, "stop_sequence"),
            StopReason::ContentFilter => write!(f, "content_filter"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Events yielded by a streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The provider accepted the request.
    Connected,
    /// A fragment of generated text.
    TextDelta { text: String },
    /// Final stop reason for the stream.
    MessageDelta { stop_reason: StopReason },
    Usage(Usage),
    Done,
}

/// How the reply pipeline should treat a failed model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationFailure {
    /// The provider refused the content. Never retried.
    SafetyBlock,
    /// Worth another attempt after a backoff.
    Transient,
    /// Retrying the same stream will not help.
    Fatal,
}

/// Errors from LLM provider calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("response blocked by safety filter: {reason}")]
    SafetyBlocked { reason: String },

    #[error("model returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    /// Classify this error for the reply state machine.
    pub fn failure_kind(&self) -> GenerationFailure {
        match self {
            LlmError::SafetyBlocked { .. } => GenerationFailure::SafetyBlock,
            LlmError::Provider { .. }
            | LlmError::Stream(_)
            | LlmError::Timeout
            | LlmError::RateLimited { .. }
            | LlmError::Overloaded(_)
            | LlmError::EmptyResponse => GenerationFailure::Transient,
            LlmError::Deserialization(_)
            | LlmError::AuthenticationFailed
            | LlmError::InvalidRequest(_) => GenerationFailure::Fatal,
        }
    }
}

/// Capabilities of an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub streaming: bool,
    pub max_context_tokens: u32,
    pub max_output_tokens: u32,
}

/// Backend family selected in `config.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Gemini => write!(f, "gemini"),
            ProviderType::OpenAi => write!(f, "openai"),
            ProviderType::OpenAiCompatible => write!(f, "openai_compatible"),
        }
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ProviderType::Gemini),
            "openai" => Ok(ProviderType::OpenAi),
            "openai_compatible" => Ok(ProviderType::OpenAiCompatible),
            other => Err(format!("invalid provider type: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant, MessageRole::System] {
            let parsed: MessageRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("bot".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_from_prompt_sets_sampling() {
        let sampling = SamplingConfig {
            temperature: 0.1,
            max_output_tokens: 512,
        };
        let req = CompletionRequest::from_prompt("gemini-flash-latest", "hello", &sampling, false);
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, MessageRole::User);
        assert_eq!(req.max_tokens, 512);
        assert_eq!(req.temperature, Some(0.1));
        assert!(!req.stream);
    }

    #[test]
    fn test_failure_kind_classification() {
        let safety = LlmError::SafetyBlocked {
            reason: "SAFETY".to_string(),
        };
        assert_eq!(safety.failure_kind(), GenerationFailure::SafetyBlock);
        assert_eq!(LlmError::Timeout.failure_kind(), GenerationFailure::Transient);
        assert_eq!(
            LlmError::Overloaded("busy".to_string()).failure_kind(),
            GenerationFailure::Transient
        );
        assert_eq!(
            LlmError::AuthenticationFailed.failure_kind(),
            GenerationFailure::Fatal
        );
    }

    #[test]
    fn test_stream_event_serde_tag() {
        let event = StreamEvent::TextDelta {
            text: "Chào".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"text_delta\""));
    }

    #[test]
    fn test_provider_type_parse() {
        assert_eq!("gemini".parse::<ProviderType>().unwrap(), ProviderType::Gemini);
        assert_eq!(
            "openai_compatible".parse::<ProviderType>().unwrap(),
            ProviderType::OpenAiCompatible
        );
        assert!("bedrock".parse::<ProviderType>().is_err());
    }
}
