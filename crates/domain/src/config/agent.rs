use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Instructions used when no instructions file is available.
pub const DEFAULT_INSTRUCTIONS: &str =
    "You are a helpful assistant. Respond concisely and helpfully.";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent definition
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The chat agent's identity and model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "d_name")]
    pub name: String,
    /// File holding the system instructions. Missing or blank files fall
    /// back to [`DEFAULT_INSTRUCTIONS`].
    #[serde(default = "d_instructions_file")]
    pub instructions_file: PathBuf,
    #[serde(default = "d_model")]
    pub model: String,
    /// Token cap sent with every chat-completion request.
    #[serde(default = "d_512")]
    pub max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: d_name(),
            instructions_file: d_instructions_file(),
            model: d_model(),
            max_tokens: d_512(),
        }
    }
}

/// Which backend answers `POST /openai`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatBackend {
    /// Local transcript + chat-completion provider.
    #[default]
    Local,
    /// Delegate to the managed agent runtime, which owns session state.
    Managed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub backend: ChatBackend,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Resolved profile
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Agent settings with the instruction text loaded. Built once at startup
/// and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub max_tokens: u32,
}

impl AgentProfile {
    pub fn load(cfg: &AgentConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            instructions: load_instructions(&cfg.instructions_file),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
        }
    }
}

/// Read the instructions file, trimmed. Falls back to
/// [`DEFAULT_INSTRUCTIONS`] when the file is missing, unreadable or blank.
pub fn load_instructions(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                tracing::warn!(path = %path.display(), "instructions file is blank, using default");
                DEFAULT_INSTRUCTIONS.to_owned()
            } else {
                tracing::info!(path = %path.display(), chars = trimmed.len(), "instructions loaded");
                trimmed.to_owned()
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no instructions file, using default");
            DEFAULT_INSTRUCTIONS.to_owned()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "reading instructions failed, using default");
            DEFAULT_INSTRUCTIONS.to_owned()
        }
    }
}

fn d_name() -> String {
    "Assistant".into()
}
fn d_instructions_file() -> PathBuf {
    PathBuf::from("instructions.txt")
}
fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_512() -> u32 {
    512
}
