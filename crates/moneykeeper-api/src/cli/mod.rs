//! CLI command definitions for the `mk` binary.

pub mod chat;
pub mod history;
pub mod wallet;

use clap::{Parser, Subcommand};
use moneykeeper_core::assistant::amount::parse_amount_phrase;
use moneykeeper_types::persona::PersonaTag;
use uuid::Uuid;

/// Vietnamese personal-finance assistant.
#[derive(Parser)]
#[command(name = "mk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed logs on stderr (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Act as this user instead of the local one.
    #[arg(long, global = true, env = "MK_USER_ID")]
    pub user: Option<Uuid>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one message to the assistant and stream the reply.
    Chat {
        /// The message, e.g. `mk chat chi 20k ăn sáng`.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Continue this session instead of the latest one.
        #[arg(long)]
        session: Option<Uuid>,

        /// friendly, strict, funny or grumpy. Defaults to the session's
        /// persona, or friendly for a new session.
        #[arg(long, value_parser = parse_persona)]
        persona: Option<PersonaTag>,
    },

    /// Manage wallets.
    Wallet {
        #[command(subcommand)]
        command: WalletCommand,
    },

    /// Print a session transcript.
    History {
        /// Defaults to the most recently active session.
        #[arg(long)]
        session: Option<Uuid>,

        /// Show only the last N messages.
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Start the HTTP server.
    Serve {
        #[arg(long, default_value = "8080")]
        port: u16,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[derive(Subcommand)]
pub enum WalletCommand {
    /// Open a wallet.
    Add {
        name: String,

        /// Opening balance; accepts shorthand such as `500k` or `1.5tr`.
        #[arg(long, default_value = "0", value_parser = parse_balance)]
        balance: i64,

        /// Make this the wallet entries go to when none is named.
        #[arg(long)]
        default: bool,
    },

    /// List wallets and balances.
    #[command(alias = "ls")]
    List,
}

fn parse_persona(s: &str) -> Result<PersonaTag, String> {
    s.parse()
}

fn parse_balance(s: &str) -> Result<i64, String> {
    parse_amount_phrase(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chat_command() {
        let cli = Cli::try_parse_from(["mk", "chat", "chi", "20k", "ăn", "sáng", "--persona", "funny"])
            .unwrap();
        match cli.command {
            Commands::Chat {
                message, persona, ..
            } => {
                assert_eq!(message.join(" "), "chi 20k ăn sáng");
                assert_eq!(persona, Some(PersonaTag::Funny));
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn test_parse_wallet_add_with_shorthand_balance() {
        let cli = Cli::try_parse_from(["mk", "wallet", "add", "Tiền mặt", "--balance", "500k", "--default"])
            .unwrap();
        match cli.command {
            Commands::Wallet {
                command:
                    WalletCommand::Add {
                        name,
                        balance,
                        default,
                    },
            } => {
                assert_eq!(name, "Tiền mặt");
                assert_eq!(balance, 500_000);
                assert!(default);
            }
            _ => panic!("expected wallet add"),
        }
    }

    #[test]
    fn test_rejects_unknown_persona() {
        assert!(Cli::try_parse_from(["mk", "chat", "hi", "--persona", "evil"]).is_err());
    }
}
