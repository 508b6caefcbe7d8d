//! Chat service: session lifecycle and message persistence on top of a
//! `ChatRepository`.

use chrono::Utc;
use moneykeeper_types::chat::{ChatMessage, ChatSession, MessageRole};
use moneykeeper_types::error::RepositoryError;
use moneykeeper_types::llm::Message;
use moneykeeper_types::persona::PersonaTag;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::repository::ChatRepository;

/// Generic over `ChatRepository` so moneykeeper-core never depends on
/// moneykeeper-infra.
pub struct ChatService<C: ChatRepository> {
    chat_repo: C,
}

impl<C: ChatRepository> ChatService<C> {
    pub fn new(chat_repo: C) -> Self {
        Self { chat_repo }
    }

    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    // --- Session lifecycle ---

    pub async fn create_session(
        &self,
        user_id: Uuid,
        persona: PersonaTag,
    ) -> Result<ChatSession, RepositoryError> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::now_v7(),
            user_id,
            persona,
            created_at: now,
            updated_at: now,
        };

        let session = self.chat_repo.create_session(&session).await?;
        info!(session_id = %session.id, user_id = %user_id, persona = %persona, "chat session created");
        Ok(session)
    }

    pub async fn get_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        self.chat_repo.get_session(session_id).await
    }

    /// Continue the user's most recent session, whatever its persona.
    /// `persona` only applies when a new session has to be opened.
    pub async fn resume_or_create_session(
        &self,
        user_id: Uuid,
        persona: PersonaTag,
    ) -> Result<ChatSession, RepositoryError> {
        if let Some(session) = self.chat_repo.latest_session(&user_id).await? {
            debug!(session_id = %session.id, persona = %session.persona, "resuming chat session");
            return Ok(session);
        }
        self.create_session(user_id, persona).await
    }

    // --- Message persistence ---

    pub async fn save_user_message(
        &self,
        session_id: Uuid,
        content: String,
    ) -> Result<ChatMessage, RepositoryError> {
        self.save_message(session_id, MessageRole::User, content).await
    }

    pub async fn save_assistant_message(
        &self,
        session_id: Uuid,
        content: String,
    ) -> Result<ChatMessage, RepositoryError> {
        self.save_message(session_id, MessageRole::Assistant, content)
            .await
    }

    async fn save_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: String,
    ) -> Result<ChatMessage, RepositoryError> {
        let message = ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            role,
            content,
            created_at: Utc::now(),
        };

        self.chat_repo.save_message(&message).await?;
        Ok(message)
    }

    /// Full message list of a session, oldest first.
    pub async fn get_messages(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.chat_repo.recent_messages(session_id, None).await
    }

    /// Whether anything has been said in the session yet.
    pub async fn has_messages(&self, session_id: &Uuid) -> Result<bool, RepositoryError> {
        let latest = self.chat_repo.recent_messages(session_id, Some(1)).await?;
        Ok(!latest.is_empty())
    }

    /// The last `limit` non-empty turns of a session, oldest first, ready for a prompt.
    pub async fn history(
        &self,
        session_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self
            .chat_repo
            .recent_messages(session_id, Some(limit))
            .await?;
        Ok(messages
            .iter()
            .filter(|m| !m.content.trim().is_empty())
            .map(ChatMessage::to_turn)
            .collect())
    }
}
