pub mod bedrock;
pub mod eventstream;
pub mod openai_compat;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use bedrock::BedrockAgentRuntime;
pub use openai_compat::OpenAiCompatProvider;
pub use traits::{AgentRuntime, ChatProvider, ChatRequest, ChatResponse, InvokeAgentRequest};
