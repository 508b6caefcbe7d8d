//! Session transcript endpoint.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use moneykeeper_core::chat::repository::ChatRepository;
use moneykeeper_types::chat::ChatMessage;
use serde::Deserialize;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::ConcreteAssistant;

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Only the newest N messages, still oldest first.
    pub limit: Option<u32>,
}

/// GET /api/v1/sessions/{id}/messages
pub async fn get_messages(
    State(assistant): State<Arc<ConcreteAssistant>>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> Result<ApiResponse<Vec<ChatMessage>>, AppError> {
    let chat = assistant.chat();
    if chat.get_session(&session_id).await?.is_none() {
        return Err(AppError::NotFound(format!("session {session_id} not found")));
    }

    let messages = chat
        .chat_repo()
        .recent_messages(&session_id, query.limit)
        .await?;
    Ok(ApiResponse::success(messages))
}
