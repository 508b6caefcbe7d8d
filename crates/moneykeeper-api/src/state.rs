//! Application state wiring repositories and the assistant together.
//!
//! Ledger and chat access is always available; the assistant (which needs a
//! generation backend and therefore an API key) is built only by the
//! commands that talk to the model.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use moneykeeper_core::assistant::AssistantService;
use moneykeeper_core::chat::service::ChatService;
use moneykeeper_infra::config::{data_dir, load_global_config};
use moneykeeper_infra::llm::{create_provider, resolve_api_key};
use moneykeeper_infra::sqlite::chat::SqliteChatRepository;
use moneykeeper_infra::sqlite::ledger::SqliteLedgerRepository;
use moneykeeper_infra::sqlite::pool::DatabasePool;
use moneykeeper_types::config::GlobalConfig;
use uuid::Uuid;

pub type ConcreteAssistant = AssistantService<SqliteLedgerRepository, SqliteChatRepository>;

pub struct AppState {
    pub data_dir: PathBuf,
    pub config: GlobalConfig,
    pub db_pool: DatabasePool,
    pub ledger: SqliteLedgerRepository,
    pub chat_service: ChatService<SqliteChatRepository>,
}

impl AppState {
    /// Resolve the data directory, load config and open the database.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let config = load_global_config(&data_dir).await;

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("moneykeeper.db").display()
        );
        let db_pool = DatabasePool::new(&db_url)
            .await
            .context("failed to open database")?;

        Ok(Self {
            ledger: SqliteLedgerRepository::new(db_pool.clone()),
            chat_service: ChatService::new(SqliteChatRepository::new(db_pool.clone())),
            data_dir,
            config,
            db_pool,
        })
    }

    /// Build the assistant with the configured generation backend.
    pub fn assistant(&self) -> anyhow::Result<Arc<ConcreteAssistant>> {
        let settings = &self.config.provider;
        let api_key = resolve_api_key(settings);
        let provider = create_provider(settings, api_key).with_context(|| {
            format!(
                "cannot create {} provider (is {} set?)",
                settings.provider_type, settings.api_key_env
            )
        })?;

        tracing::info!(provider = provider.name(), model = %settings.model, "assistant ready");

        Ok(Arc::new(AssistantService::new(
            SqliteLedgerRepository::new(self.db_pool.clone()),
            SqliteChatRepository::new(self.db_pool.clone()),
            provider,
            self.config.clone(),
        )))
    }

    /// The single local user of a CLI install, created on first use.
    pub async fn local_user_id(&self) -> anyhow::Result<Uuid> {
        read_or_create_user_id(&self.data_dir.join("user_id")).await
    }
}

async fn read_or_create_user_id(path: &Path) -> anyhow::Result<Uuid> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Uuid::parse_str(content.trim())
            .with_context(|| format!("invalid user id in {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let id = Uuid::now_v7();
            tokio::fs::write(path, id.to_string())
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::debug!(user_id = %id, "created local user id");
            Ok(id)
        }
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_user_id_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_id");

        let first = read_or_create_user_id(&path).await.unwrap();
        let second = read_or_create_user_id(&path).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_local_user_id_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_id");
        tokio::fs::write(&path, "not-a-uuid").await.unwrap();

        assert!(read_or_create_user_id(&path).await.is_err());
    }
}
