//! Shared domain types for the MoneyKeeper assistant.
//!
//! Ledger entities, chat sessions, parsed commands, persona tags, LLM wire
//! types and the error enums shared by every other crate.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod command;
pub mod config;
pub mod error;
pub mod ledger;
pub mod llm;
pub mod persona;
