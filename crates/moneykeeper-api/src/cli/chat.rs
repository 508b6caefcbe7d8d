//! `mk chat`: one message in, the reply streamed to stdout.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Result, bail};
use console::style;
use futures_util::StreamExt;
use moneykeeper_core::assistant::persona::Persona;
use moneykeeper_types::chat::ChatSession;
use moneykeeper_types::persona::PersonaTag;
use uuid::Uuid;

use crate::state::ConcreteAssistant;

pub async fn send(
    assistant: &Arc<ConcreteAssistant>,
    user_id: Uuid,
    session_id: Option<Uuid>,
    persona: Option<PersonaTag>,
    message: String,
) -> Result<()> {
    let session = resolve_session(assistant, user_id, session_id, persona).await?;
    let persona = persona.unwrap_or(session.persona);
    let first_turn = !assistant.chat().has_messages(&session.id).await?;

    let mut reply = assistant.handle_message(session.id, user_id, persona, message);

    let mut stdout = std::io::stdout();
    println!();
    if first_turn {
        println!("{}", style(Persona::for_tag(persona).greeting).bold());
        println!();
    }
    while let Some(fragment) = reply.next().await {
        print!("{fragment}");
        stdout.flush()?;
    }
    println!();
    println!();
    eprintln!("  {}", style(format!("session {}", session.id)).dim());

    Ok(())
}

async fn resolve_session(
    assistant: &ConcreteAssistant,
    user_id: Uuid,
    session_id: Option<Uuid>,
    persona: Option<PersonaTag>,
) -> Result<ChatSession> {
    let chat = assistant.chat();
    match session_id {
        Some(id) => match chat.get_session(&id).await? {
            Some(session) if session.user_id == user_id => Ok(session),
            _ => bail!("session {id} not found"),
        },
        None => Ok(chat
            .resume_or_create_session(user_id, persona.unwrap_or_default())
            .await?),
    }
}
