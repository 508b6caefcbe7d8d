//! `mk wallet`: open and list wallets.

use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets};
use console::style;
use moneykeeper_core::assistant::format::format_vnd;
use moneykeeper_core::ledger::repository::LedgerRepository;
use uuid::Uuid;

use crate::state::AppState;

pub async fn add_wallet(
    state: &AppState,
    user_id: Uuid,
    name: &str,
    balance: i64,
    is_default: bool,
    json: bool,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("wallet name must not be empty");
    }

    // The first wallet is the default whether or not it was asked for.
    let is_default = is_default || state.ledger.list_wallets(&user_id).await?.is_empty();
    let wallet = state
        .ledger
        .create_wallet(&user_id, name, balance, is_default)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&wallet)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Wallet {} opened with {}{}",
        style("✓").green().bold(),
        style(&wallet.name).cyan(),
        style(format_vnd(wallet.balance)).bold(),
        if wallet.is_default { " (default)" } else { "" }
    );
    println!();
    Ok(())
}

pub async fn list_wallets(state: &AppState, user_id: Uuid, json: bool) -> Result<()> {
    let wallets = state.ledger.list_wallets(&user_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&wallets)?);
        return Ok(());
    }

    if wallets.is_empty() {
        println!();
        println!(
            "  {} No wallets yet. Open one with: {}",
            style("i").blue().bold(),
            style("mk wallet add <name> --balance 500k").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Wallet").fg(Color::White),
        Cell::new("Balance").fg(Color::White),
        Cell::new("").fg(Color::White),
    ]);

    for wallet in &wallets {
        let balance = Cell::new(format_vnd(wallet.balance)).set_alignment(CellAlignment::Right);
        let balance = if wallet.balance < 0 {
            balance.fg(Color::Red)
        } else {
            balance
        };
        table.add_row(vec![
            Cell::new(&wallet.name).fg(Color::Cyan),
            balance,
            Cell::new(if wallet.is_default { "default" } else { "" }).fg(Color::DarkGrey),
        ]);
    }

    let total: i64 = wallets.iter().map(|w| w.balance).sum();

    println!();
    println!("{table}");
    println!();
    println!("  Total: {}", style(format_vnd(total)).bold());
    println!();
    Ok(())
}
