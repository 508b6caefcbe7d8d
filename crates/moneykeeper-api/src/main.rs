//! MoneyKeeper CLI and HTTP entry point.
//!
//! Binary name: `mk`
//!
//! Parses CLI arguments, opens the database, then dispatches to a command
//! handler or starts the HTTP server.

mod cli;
mod http;
mod state;

use clap::Parser;
use moneykeeper_observe::{TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, WalletCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = TracingOptions {
        default_filter: filter_for_verbosity(cli.verbose).to_string(),
        json: cli.log_json,
        enable_otel: cli.otel,
    };
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;
    let user_id = match cli.user {
        Some(id) => id,
        None => state.local_user_id().await?,
    };

    match cli.command {
        Commands::Chat {
            message,
            session,
            persona,
        } => {
            let assistant = state.assistant()?;
            cli::chat::send(&assistant, user_id, session, persona, message.join(" ")).await?;
        }

        Commands::Wallet { command } => match command {
            WalletCommand::Add {
                name,
                balance,
                default,
            } => {
                cli::wallet::add_wallet(&state, user_id, &name, balance, default, cli.json)
                    .await?;
            }
            WalletCommand::List => {
                cli::wallet::list_wallets(&state, user_id, cli.json).await?;
            }
        },

        Commands::History { session, limit } => {
            cli::history::show_history(&state, user_id, session, limit, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            let assistant = state.assistant()?;
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} MoneyKeeper API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(assistant);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
