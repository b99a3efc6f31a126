//! Shared types for the chat relay: configuration, errors, conversation
//! turns and structured trace events.

pub mod config;
pub mod error;
pub mod message;
pub mod stream;
pub mod trace;
