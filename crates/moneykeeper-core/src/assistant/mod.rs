//! The conversational command and response pipeline.
//!
//! Leaf modules first: `amount` and `extractor` are pure text processing,
//! `intent` and `generator` talk to the generation backend, `executor` and
//! `context` talk to the ledger, and `pipeline` ties them together.

pub mod amount;
pub mod category;
pub mod context;
pub mod direct_answer;
pub mod executor;
pub mod extractor;
pub mod format;
pub mod generator;
pub mod intent;
pub mod keywords;
pub mod persona;
pub mod pipeline;
pub mod prompt;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use generator::{FragmentSink, GENERIC_APOLOGY, SAFETY_APOLOGY};
pub use pipeline::{AssistantService, ReplyStream, TurnPath, TurnReport};
