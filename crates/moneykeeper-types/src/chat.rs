//! Chat session and message types.
//!
//! A session belongs to one user and carries the persona it was opened
//! with. Messages are ordered by `created_at` within a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::llm::MessageRole;
use crate::llm::Message;
use crate::persona::PersonaTag;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub persona: PersonaTag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single stored message. Only `User` and `Assistant` roles are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// The history turn this message contributes to a prompt.
    pub fn to_turn(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}
