//! Managed agent relay.
//!
//! The hosted runtime owns conversation state, so no local transcript is
//! touched here: the prompt goes out keyed by agent id, alias id and the
//! caller's session key, and the streamed chunks are concatenated.

use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use relay_domain::config::ManagedAgentConfig;
use relay_domain::error::{Error, Result};
use relay_domain::trace::TraceEvent;
use relay_providers::{AgentRuntime, BedrockAgentRuntime, InvokeAgentRequest};

/// The assembled answer of one managed agent invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCompletion {
    pub session_key: String,
    pub completion: String,
}

pub struct ManagedAgent {
    runtime: Arc<dyn AgentRuntime>,
    agent_id: String,
    agent_alias_id: String,
}

impl ManagedAgent {
    pub fn new(
        runtime: Arc<dyn AgentRuntime>,
        agent_id: impl Into<String>,
        agent_alias_id: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            agent_id: agent_id.into(),
            agent_alias_id: agent_alias_id.into(),
        }
    }

    /// Wire up the Bedrock Agents runtime from config.
    pub fn from_config(cfg: &ManagedAgentConfig) -> Result<Self> {
        let runtime = BedrockAgentRuntime::from_config(cfg)?;
        Ok(Self::new(
            Arc::new(runtime),
            cfg.agent_id.clone(),
            cfg.agent_alias_id.clone(),
        ))
    }

    /// Invoke the agent and propagate every failure, including a runtime
    /// that accepted the call but returned no completion stream. Invalid
    /// UTF-8 in the assembled reply is replaced, not rejected.
    pub async fn complete(&self, prompt: &str, session_key: &str) -> Result<AgentCompletion> {
        let started = Instant::now();
        let req = InvokeAgentRequest {
            agent_id: self.agent_id.clone(),
            agent_alias_id: self.agent_alias_id.clone(),
            session_id: session_key.to_owned(),
            input_text: prompt.to_owned(),
        };

        let mut stream = self
            .runtime
            .invoke_agent(&req)
            .await?
            .ok_or_else(|| Error::Provider {
                provider: self.runtime.runtime_id().to_owned(),
                message: "completion stream is missing".into(),
            })?;

        // Chunk boundaries can split a multibyte character, so decode once
        // at the end.
        let mut bytes = Vec::new();
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            bytes.extend_from_slice(&chunk?);
            chunks += 1;
        }
        let completion = String::from_utf8_lossy(&bytes).into_owned();

        TraceEvent::AgentInvoked {
            runtime: self.runtime.runtime_id().to_owned(),
            agent_id: self.agent_id.clone(),
            session_key: session_key.to_owned(),
            chunks,
            reply_chars: completion.chars().count(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();

        Ok(AgentCompletion {
            session_key: session_key.to_owned(),
            completion,
        })
    }

    /// Like [`complete`](Self::complete), but every failure is logged and
    /// becomes `None`. `Some` with an empty completion is a real (empty)
    /// answer.
    pub async fn invoke(&self, prompt: &str, session_key: &str) -> Option<AgentCompletion> {
        match self.complete(prompt, session_key).await {
            Ok(completion) => Some(completion),
            Err(e) => {
                tracing::warn!(
                    runtime = %self.runtime.runtime_id(),
                    session_key,
                    error = %e,
                    "managed agent invocation failed"
                );
                None
            }
        }
    }
}
