//! LLM provider implementations.
//!
//! [`create_provider`] builds the configured backend once at startup; the
//! resulting [`BoxLlmProvider`] is injected into the assistant service.

pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use moneykeeper_core::llm::box_provider::BoxLlmProvider;
use moneykeeper_types::config::ProviderSettings;
use moneykeeper_types::llm::{LlmError, ProviderType};

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{compatible_defaults, gemini_defaults, openai_defaults};

/// Read the API key from the environment variable named in the settings.
/// Empty values count as missing.
pub fn resolve_api_key(settings: &ProviderSettings) -> Option<SecretString> {
    std::env::var(&settings.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}

/// Create a [`BoxLlmProvider`] from the `[provider]` settings.
///
/// Gemini and OpenAI require a key. A generic compatible server requires a
/// `base_url` and gets a placeholder key when none is set, since local
/// servers usually ignore it.
pub fn create_provider(
    settings: &ProviderSettings,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let config = match settings.provider_type {
        ProviderType::Gemini => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            gemini_defaults(key, &settings.model)
        }
        ProviderType::OpenAi => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            openai_defaults(key, &settings.model)
        }
        ProviderType::OpenAiCompatible => {
            let base_url = settings.base_url.as_deref().ok_or_else(|| {
                LlmError::InvalidRequest("openai_compatible provider needs base_url".to_string())
            })?;
            let key = api_key.unwrap_or_else(|| SecretString::from("unused"));
            compatible_defaults(base_url, key, &settings.model)
        }
    };

    let mut config = config.with_timeout(Duration::from_secs(settings.request_timeout_secs));
    if settings.provider_type != ProviderType::OpenAiCompatible {
        if let Some(base_url) = settings.base_url.as_deref() {
            config = config.with_base_url(base_url);
        }
    }

    tracing::debug!(
        provider = %settings.provider_type,
        model = %settings.model,
        base_url = %config.base_url,
        "creating LLM provider"
    );

    Ok(BoxLlmProvider::new(OpenAiCompatibleProvider::new(config)?))
}
