//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `moneykeeper-core` with raw queries and
//! private Row structs over the split reader/writer pools.

use moneykeeper_core::chat::repository::ChatRepository;
use moneykeeper_types::chat::{ChatMessage, ChatSession, MessageRole};
use moneykeeper_types::error::RepositoryError;
use moneykeeper_types::persona::PersonaTag;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid, query_error};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ChatSessionRow {
    id: String,
    user_id: String,
    persona: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            persona: row.try_get("persona")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        Ok(ChatSession {
            id: parse_uuid(&self.id, "session id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            // A tag written by an older build should not make the session unreadable.
            persona: PersonaTag::parse_lossy(&self.persona),
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    id: String,
    session_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self.role.parse().map_err(RepositoryError::Query)?;
        Ok(ChatMessage {
            id: parse_uuid(&self.id, "message id")?,
            session_id: parse_uuid(&self.session_id, "session_id")?,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn rows_to_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ChatMessage>, RepositoryError> {
    rows.iter()
        .map(|row| {
            ChatMessageRow::from_row(row)
                .map_err(query_error)?
                .into_message()
        })
        .collect()
}

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            "INSERT INTO chat_sessions (id, user_id, persona, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(session.persona.to_string())
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!(
                        "session {} already exists",
                        session.id
                    ));
                }
            }
            query_error(e)
        })?;

        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.map(|r| {
            ChatSessionRow::from_row(&r)
                .map_err(query_error)?
                .into_session()
        })
        .transpose()
    }

    async fn latest_session(&self, user_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM chat_sessions WHERE user_id = ? ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        row.map(|r| {
            ChatSessionRow::from_row(&r)
                .map_err(query_error)?
                .into_session()
        })
        .transpose()
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        if message.role == MessageRole::System {
            return Err(RepositoryError::Query(
                "system messages are not stored".to_string(),
            ));
        }

        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let created_at = format_datetime(&message.created_at);
        let touched = sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
            .bind(&created_at)
            .bind(message.session_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        if touched.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "INSERT INTO chat_messages (id, session_id, role, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.session_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn recent_messages(
        &self,
        session_id: &Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        // Newest N in the subquery, re-sorted oldest first. The id breaks ties
        // between messages written within the same microsecond (UUIDv7 sorts by time).
        let rows = match limit {
            Some(limit) => sqlx::query(
                "SELECT * FROM (
                     SELECT * FROM chat_messages WHERE session_id = ?
                     ORDER BY created_at DESC, id DESC LIMIT ?
                 ) ORDER BY created_at ASC, id ASC",
            )
            .bind(session_id.to_string())
            .bind(limit as i64)
            .fetch_all(&self.pool.reader)
            .await,
            None => sqlx::query(
                "SELECT * FROM chat_messages WHERE session_id = ? ORDER BY created_at ASC, id ASC",
            )
            .bind(session_id.to_string())
            .fetch_all(&self.pool.reader)
            .await,
        }
        .map_err(query_error)?;

        rows_to_messages(&rows)
    }
}
