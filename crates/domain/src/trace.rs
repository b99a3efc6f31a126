use serde::Serialize;

/// Structured trace events emitted across all relay crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionCreated {
        session_key: String,
        live_sessions: usize,
    },
    SessionEvicted {
        session_key: String,
        reason: String,
    },
    TranscriptAppend {
        session_key: String,
        role: String,
        turns: usize,
    },
    LlmRequest {
        provider: String,
        model: String,
        status: u16,
        duration_ms: u64,
    },
    AgentInvoked {
        runtime: String,
        agent_id: String,
        session_key: String,
        chunks: usize,
        reply_chars: usize,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "relay_event");
    }
}
