//! `mk history`: print a session transcript.

use anyhow::{Result, bail};
use console::style;
use moneykeeper_core::chat::repository::ChatRepository;
use moneykeeper_types::chat::MessageRole;
use uuid::Uuid;

use crate::state::AppState;

pub async fn show_history(
    state: &AppState,
    user_id: Uuid,
    session_id: Option<Uuid>,
    limit: Option<u32>,
    json: bool,
) -> Result<()> {
    let repo = state.chat_service.chat_repo();
    let session = match session_id {
        Some(id) => match state.chat_service.get_session(&id).await? {
            Some(session) if session.user_id == user_id => session,
            _ => bail!("session {id} not found"),
        },
        None => match repo.latest_session(&user_id).await? {
            Some(session) => session,
            None => {
                println!();
                println!(
                    "  {} No conversations yet. Start one with: {}",
                    style("i").blue().bold(),
                    style("mk chat <message>").yellow()
                );
                println!();
                return Ok(());
            }
        },
    };

    let messages = repo.recent_messages(&session.id, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} ({})",
        style("Session").bold(),
        style(session.id.to_string()).dim(),
        session.persona
    );
    println!();

    for message in &messages {
        let time = message.created_at.format("%Y-%m-%d %H:%M");
        let speaker = match message.role {
            MessageRole::User => style("Bạn").cyan().bold(),
            _ => style("MoneyKeeper").green().bold(),
        };
        println!("  {speaker} {}", style(time).dim());
        for line in message.content.lines() {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}
