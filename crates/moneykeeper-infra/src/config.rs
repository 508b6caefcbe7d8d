//! Global configuration loader for MoneyKeeper.
//!
//! Reads `config.toml` from the data directory (`~/.moneykeeper/` unless
//! `MONEYKEEPER_DATA_DIR` says otherwise), then applies the environment
//! overrides. A missing or malformed file falls back to defaults.

use std::path::{Path, PathBuf};

use moneykeeper_types::config::GlobalConfig;

pub const DATA_DIR_ENV: &str = "MONEYKEEPER_DATA_DIR";
pub const MODEL_ENV: &str = "AI_MODEL_NAME";
pub const TIMEOUT_ENV: &str = "AI_REQUEST_TIMEOUT";

/// `MONEYKEEPER_DATA_DIR`, falling back to `~/.moneykeeper`.
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".moneykeeper")
        })
}

/// Load `{data_dir}/config.toml` and apply process environment overrides.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let mut config = read_config_file(data_dir).await;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

async fn read_config_file(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// `AI_MODEL_NAME` replaces the model; `AI_REQUEST_TIMEOUT` (whole seconds)
/// replaces the request timeout. Unparseable values are ignored.
pub fn apply_env_overrides(config: &mut GlobalConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
        config.provider.model = model.trim().to_string();
    }

    if let Some(raw) = lookup(TIMEOUT_ENV) {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => config.provider.request_timeout_secs = secs,
            _ => tracing::warn!(value = %raw, "ignoring invalid {TIMEOUT_ENV}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.provider.model, "gemini-flash-latest");
        assert_eq!(config.retry.max_stream_retries, 2);
    }

    #[tokio::test]
    async fn read_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[provider]
model = "gemini-2.5-pro"
request_timeout_secs = 60

[context]
history_limit = 8
"#,
        )
        .await
        .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.provider.model, "gemini-2.5-pro");
        assert_eq!(config.provider.request_timeout_secs, 60);
        assert_eq!(config.context.history_limit, 8);
        assert_eq!(config.fallback.max_output_tokens, 256);
    }

    #[tokio::test]
    async fn read_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.provider.request_timeout_secs, 30);
    }

    #[test]
    fn env_overrides_model_and_timeout() {
        let env: HashMap<&str, &str> =
            HashMap::from([(MODEL_ENV, "gemini-2.5-flash"), (TIMEOUT_ENV, "45")]);
        let mut config = GlobalConfig::default();
        apply_env_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.provider.model, "gemini-2.5-flash");
        assert_eq!(config.provider.request_timeout_secs, 45);
    }

    #[test]
    fn env_overrides_ignore_bad_values() {
        let env: HashMap<&str, &str> = HashMap::from([(MODEL_ENV, "  "), (TIMEOUT_ENV, "soon")]);
        let mut config = GlobalConfig::default();
        apply_env_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.provider.model, "gemini-flash-latest");
        assert_eq!(config.provider.request_timeout_secs, 30);
    }
}
