//! Global configuration types for the MoneyKeeper assistant.
//!
//! `GlobalConfig` represents `{data_dir}/config.toml`. Every section and
//! every field has a default, so an empty or missing file is valid.

use serde::{Deserialize, Serialize};

use crate::llm::{ProviderType, SamplingConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Sampling for the streamed reply.
    #[serde(default = "default_generation")]
    pub generation: SamplingConfig,

    /// Sampling for intent parsing.
    #[serde(default = "default_intent")]
    pub intent: SamplingConfig,

    /// Sampling for the single-shot fallback after streaming gave up.
    #[serde(default = "default_fallback")]
    pub fallback: SamplingConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub context: ContextSettings,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            generation: default_generation(),
            intent: default_intent(),
            fallback: default_fallback(),
            retry: RetrySettings::default(),
            context: ContextSettings::default(),
        }
    }
}

fn default_generation() -> SamplingConfig {
    SamplingConfig {
        temperature: 0.7,
        max_output_tokens: 2048,
    }
}

fn default_intent() -> SamplingConfig {
    SamplingConfig {
        temperature: 0.1,
        max_output_tokens: 512,
    }
}

fn default_fallback() -> SamplingConfig {
    SamplingConfig {
        temperature: 0.7,
        max_output_tokens: 256,
    }
}

/// Which backend to talk to and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    /// Overrides the provider's default endpoint.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Overridden by `AI_MODEL_NAME`.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Overridden by `AI_REQUEST_TIMEOUT`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            base_url: None,
            model: default_model(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_provider_type() -> ProviderType {
    ProviderType::Gemini
}

fn default_model() -> String {
    "gemini-flash-latest".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Stream retry policy. Waits are `min(base * 2^retry, max)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Extra streaming attempts after the first one.
    #[serde(default = "default_max_stream_retries")]
    pub max_stream_retries: u32,

    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_stream_retries: default_max_stream_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_max_stream_retries() -> u32 {
    2
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    5000
}

/// Bounds on what gets packed into a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSettings {
    /// Most recent messages of the session included as history.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Oldest history turns are dropped until the prompt fits.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Cap on the ledger context string.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            max_prompt_chars: default_max_prompt_chars(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

fn default_history_limit() -> u32 {
    20
}

fn default_max_prompt_chars() -> usize {
    30_000
}

fn default_max_context_chars() -> usize {
    1200
}
