//! Assistant pipeline and repository trait definitions for MoneyKeeper.
//!
//! This crate defines the "ports" (repository and provider traits) that the
//! infrastructure layer implements, plus the message pipeline that turns a
//! chat message into ledger writes and a streamed reply. It depends only on
//! `moneykeeper-types` -- never on `moneykeeper-infra` or any database/IO crate.

pub mod assistant;
pub mod chat;
pub mod ledger;
pub mod llm;
