//! Conversation store: the `ChatRepository` port and the `ChatService` on top of it.

pub mod repository;
pub mod service;
