//! The shared chat agent behind `POST /openai`.
//!
//! One process-wide [`ConversationAgent`] is created lazily on first use.
//! Which implementation it is depends on `chat.backend`:
//!
//! - [`TranscriptAgent`] keeps a local transcript per session and sends the
//!   whole history to a chat-completion provider on every turn
//! - [`HostedAgent`] forwards to the managed agent runtime, which keeps
//!   session state itself

use std::sync::Arc;

use relay_domain::config::{AgentProfile, ChatBackend, Config};
use relay_domain::error::Result;
use relay_domain::message::Role;
use relay_providers::{ChatProvider, ChatRequest, OpenAiCompatProvider};
use relay_sessions::ConversationStore;
use serde_json::Value;
use tokio::sync::OnceCell;

use super::content::build_user_content;
use super::managed::ManagedAgent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent interface
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The reply to one chat turn.
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub reply: String,
    /// Provider response document, when the backend has one.
    pub raw: Option<Value>,
}

#[async_trait::async_trait]
pub trait ConversationAgent: Send + Sync {
    /// Run one turn for `session_key` with already-rendered user content.
    async fn execute(&self, content: &str, session_key: &str) -> Result<AgentOutput>;

    /// Short backend label for logs.
    fn backend(&self) -> &'static str;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Local transcript backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct TranscriptAgent {
    conversations: Arc<ConversationStore>,
    provider: Arc<dyn ChatProvider>,
    model: String,
    max_tokens: u32,
}

impl TranscriptAgent {
    pub fn new(
        conversations: Arc<ConversationStore>,
        provider: Arc<dyn ChatProvider>,
        profile: &AgentProfile,
    ) -> Self {
        Self {
            conversations,
            provider,
            model: profile.model.clone(),
            max_tokens: profile.max_tokens,
        }
    }
}

#[async_trait::async_trait]
impl ConversationAgent for TranscriptAgent {
    async fn execute(&self, content: &str, session_key: &str) -> Result<AgentOutput> {
        // A call that cannot be attempted must not leave a user turn behind.
        self.provider.ensure_ready()?;

        let transcript = self.conversations.get_or_create(session_key);
        transcript.append(Role::User, content);

        let req = ChatRequest {
            messages: transcript.snapshot(),
            model: Some(self.model.clone()),
            max_tokens: Some(self.max_tokens),
        };
        // The user turn stays in the transcript even if the call fails.
        let resp = self.provider.chat(&req).await?;

        transcript.append(Role::Assistant, resp.content.clone());
        Ok(AgentOutput {
            reply: resp.content,
            raw: Some(resp.raw),
        })
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Managed runtime backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct HostedAgent {
    managed: Arc<ManagedAgent>,
}

impl HostedAgent {
    pub fn new(managed: Arc<ManagedAgent>) -> Self {
        Self { managed }
    }
}

#[async_trait::async_trait]
impl ConversationAgent for HostedAgent {
    async fn execute(&self, content: &str, session_key: &str) -> Result<AgentOutput> {
        let out = self.managed.complete(content, session_key).await?;
        Ok(AgentOutput {
            reply: out.completion,
            raw: None,
        })
    }

    fn backend(&self) -> &'static str {
        "managed"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Shared instance
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub type AgentFactory = Box<dyn Fn() -> Result<Arc<dyn ConversationAgent>> + Send + Sync>;

/// Lazily-built process-wide chat agent.
///
/// Concurrent first callers wait on a single initialization. A failed
/// initialization leaves the cell empty, so the next call tries again.
pub struct SharedAgent {
    cell: OnceCell<Arc<dyn ConversationAgent>>,
    factory: AgentFactory,
}

impl SharedAgent {
    pub fn new(factory: AgentFactory) -> Self {
        Self {
            cell: OnceCell::new(),
            factory,
        }
    }

    /// Choose the backend from `chat.backend`. Nothing is built until the
    /// first call.
    pub fn from_config(
        config: &Config,
        profile: AgentProfile,
        conversations: Arc<ConversationStore>,
        managed: Arc<ManagedAgent>,
    ) -> Self {
        let factory: AgentFactory = match config.chat.backend {
            ChatBackend::Local => {
                let openai = config.openai.clone();
                Box::new(move || {
                    let provider = OpenAiCompatProvider::from_config(&openai, &profile.model)?;
                    let agent: Arc<dyn ConversationAgent> = Arc::new(TranscriptAgent::new(
                        conversations.clone(),
                        Arc::new(provider),
                        &profile,
                    ));
                    Ok(agent)
                })
            }
            ChatBackend::Managed => Box::new(move || {
                let agent: Arc<dyn ConversationAgent> = Arc::new(HostedAgent::new(managed.clone()));
                Ok(agent)
            }),
        };
        Self::new(factory)
    }

    pub async fn get(&self) -> Result<Arc<dyn ConversationAgent>> {
        let agent = self
            .cell
            .get_or_try_init(|| async {
                let agent = (self.factory)()?;
                tracing::info!(backend = agent.backend(), "chat agent initialized");
                Ok::<_, relay_domain::error::Error>(agent)
            })
            .await?;
        Ok(agent.clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Render `message` and run one turn on the shared agent.
    pub async fn invoke(&self, message: &Value, session_key: &str) -> Result<AgentOutput> {
        let content = build_user_content(message);
        let agent = self.get().await?;
        agent.execute(&content, session_key).await
    }
}
