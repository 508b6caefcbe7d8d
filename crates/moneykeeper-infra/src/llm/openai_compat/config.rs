//! Configuration and per-backend defaults for OpenAI-compatible providers.
//!
//! Gemini is reached through its OpenAI-compatible endpoint, so one client
//! serves every supported backend.

use std::time::Duration;

use moneykeeper_types::llm::ProviderCapabilities;
use secrecy::SecretString;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "gemini").
    pub provider_name: String,
    pub base_url: String,
    pub api_key: SecretString,
    /// Default model when a request leaves `model` empty.
    pub model: String,
    /// Whole-request timeout on the underlying HTTP client.
    pub request_timeout: Duration,
    pub capabilities: ProviderCapabilities,
}

impl OpenAiCompatConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Google Gemini over the OpenAI-compatible beta endpoint; 1M context, 64K output.
pub fn gemini_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "gemini".into(),
        base_url: GEMINI_BASE_URL.into(),
        api_key,
        model: model.into(),
        request_timeout: Duration::from_secs(30),
        capabilities: ProviderCapabilities {
            streaming: true,
            max_context_tokens: 1_000_000,
            max_output_tokens: 65_536,
        },
    }
}

/// OpenAI; 128K context, 16K output.
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: OPENAI_BASE_URL.into(),
        api_key,
        model: model.into(),
        request_timeout: Duration::from_secs(30),
        capabilities: ProviderCapabilities {
            streaming: true,
            max_context_tokens: 128_000,
            max_output_tokens: 16_384,
        },
    }
}

/// Any other server speaking the chat completions protocol (local models,
/// proxies). Limits are conservative since nothing is known about the model.
pub fn compatible_defaults(base_url: &str, api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai_compatible".into(),
        base_url: base_url.into(),
        api_key,
        model: model.into(),
        request_timeout: Duration::from_secs(30),
        capabilities: ProviderCapabilities {
            streaming: true,
            max_context_tokens: 32_000,
            max_output_tokens: 4_096,
        },
    }
}
