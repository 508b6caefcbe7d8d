//! HTTP API for the assistant.
//!
//! Axum routes under `/api/v1/` with an envelope response format and CORS.
//! Authentication belongs to the surrounding service; callers pass the
//! authenticated `user_id` in the request.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
