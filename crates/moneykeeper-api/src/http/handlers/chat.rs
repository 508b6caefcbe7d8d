//! SSE streaming chat endpoint.
//!
//! POST /api/v1/chat
//!
//! SSE event types:
//! - `session`: first event, `{ "session_id": "..." }`
//! - `text_delta`: one reply fragment, `{ "text": "..." }`
//! - `done`: `{}`
//!
//! The reply is never empty and failures inside the turn arrive as ordinary
//! text, so there is no `error` event once the stream has started.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt, stream};
use moneykeeper_types::persona::PersonaTag;
use serde::Deserialize;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::state::ConcreteAssistant;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Authenticated caller, as established by the surrounding service.
    pub user_id: Uuid,
    /// Continue this session; otherwise the user's latest one (or a new one).
    pub session_id: Option<Uuid>,
    /// Overrides the session's persona for this turn.
    pub persona: Option<String>,
    pub message: String,
}

fn json_event(name: &str, data: serde_json::Value) -> Event {
    Event::default().event(name).data(data.to_string())
}

/// POST /api/v1/chat
pub async fn stream_chat(
    State(assistant): State<Arc<ConcreteAssistant>>,
    Json(body): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let message = body.message.trim().to_string();
    if message.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }
    let requested_persona = body.persona.as_deref().map(PersonaTag::parse_lossy);

    let chat = assistant.chat();
    let session = match body.session_id {
        Some(id) => match chat.get_session(&id).await? {
            Some(session) if session.user_id == body.user_id => session,
            _ => return Err(AppError::NotFound(format!("session {id} not found"))),
        },
        None => {
            chat.resume_or_create_session(body.user_id, requested_persona.unwrap_or_default())
                .await?
        }
    };
    let persona = requested_persona.unwrap_or(session.persona);

    tracing::debug!(session_id = %session.id, %persona, "streaming chat turn");

    let reply = assistant.handle_message(session.id, body.user_id, persona, message);

    let head = stream::once(async move {
        json_event("session", serde_json::json!({ "session_id": session.id }))
    });
    let deltas = reply.map(|text| json_event("text_delta", serde_json::json!({ "text": text })));
    let tail = stream::once(async { json_event("done", serde_json::json!({})) });

    let events = head.chain(deltas).chain(tail).map(Ok);

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
