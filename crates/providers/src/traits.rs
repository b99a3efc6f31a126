use relay_domain::error::Result;
use relay_domain::message::Turn;
use relay_domain::stream::ChunkStream;
use serde_json::Value;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat completions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// The full transcript, system turn first.
    pub messages: Vec<Turn>,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
    /// Maximum tokens in the response. `None` lets the provider choose.
    pub max_tokens: Option<u32>,
}

/// A provider-agnostic chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Text of the first choice; empty when the provider sent none.
    pub content: String,
    /// The model that actually produced the response.
    pub model: String,
    pub finish_reason: Option<String>,
    /// The provider's response document, untouched.
    pub raw: Value,
}

/// A stateless chat-completion backend: the caller sends the whole
/// transcript on every call.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// Fail fast if a call could not even be attempted, e.g. the credential
    /// is missing. Sends nothing.
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Managed agent runtime
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One invocation of a hosted agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeAgentRequest {
    pub agent_id: String,
    pub agent_alias_id: String,
    /// Session continuity is owned by the runtime, keyed by this id.
    pub session_id: String,
    pub input_text: String,
}

/// A hosted agent service that keeps multi-turn state itself and streams
/// its answer back as raw text chunks.
#[async_trait::async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Start an invocation. `Ok(None)` means the runtime accepted the call
    /// but produced no completion stream at all.
    async fn invoke_agent(&self, req: &InvokeAgentRequest) -> Result<Option<ChunkStream>>;

    fn runtime_id(&self) -> &str;
}
