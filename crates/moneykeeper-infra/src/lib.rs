//! Infrastructure layer for MoneyKeeper.
//!
//! Implementations of the ports defined in `moneykeeper-core`: SQLite
//! storage for the ledger and the conversation store, the OpenAI-compatible
//! generation backend (Gemini by default), and the config file loader.

pub mod config;
pub mod llm;
pub mod sqlite;
