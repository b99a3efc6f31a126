//! Agent adapters: the managed agent runtime relay and the shared chat
//! agent behind `POST /openai`.

pub mod agent;
pub mod content;
pub mod managed;

pub use agent::{AgentOutput, ConversationAgent, HostedAgent, SharedAgent, TranscriptAgent};
pub use content::build_user_content;
pub use managed::{AgentCompletion, ManagedAgent};
