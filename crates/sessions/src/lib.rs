//! In-memory conversation state for the chat relay.
//!
//! Each session key maps to an append-only transcript seeded with the
//! agent's system instructions. Transcripts are bounded by an eviction
//! policy (capacity + idle TTL) and vanish with the process.

pub mod store;
pub mod transcript;

pub use store::{resolve_session_key, ConversationStore, EvictionPolicy, DEFAULT_SESSION_KEY};
pub use transcript::Transcript;
