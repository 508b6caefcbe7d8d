//! ChatRepository trait definition.
//!
//! Session and message persistence for the conversation store. Same RPITIT
//! pattern as `LedgerRepository`.

use moneykeeper_types::chat::{ChatMessage, ChatSession};
use moneykeeper_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in moneykeeper-infra (`SqliteChatRepository`).
pub trait ChatRepository: Send + Sync {
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// The user's most recently updated session, if any.
    fn latest_session(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Append a message and bump the session's `updated_at`.
    fn save_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The newest `limit` messages of a session, returned oldest first.
    /// `None` returns the whole session.
    fn recent_messages(
        &self,
        session_id: &Uuid,
        limit: Option<u32>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}
