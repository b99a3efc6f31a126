use std::sync::Arc;

use relay_domain::config::Config;
use relay_sessions::ConversationStore;

use crate::runtime::{ManagedAgent, SharedAgent};

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Local transcripts for the chat-completion backend.
    pub conversations: Arc<ConversationStore>,
    /// Relay to the hosted agent runtime behind `POST /`.
    pub managed: Arc<ManagedAgent>,
    /// Lazily-built agent behind `POST /openai`.
    pub chat_agent: Arc<SharedAgent>,
}
