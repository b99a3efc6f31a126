mod agent;
mod llm;
mod observability;
mod server;
mod sessions;

pub use agent::*;
pub use llm::*;
pub use observability::*;
pub use server::*;
pub use sessions::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub managed_agent: ManagedAgentConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Environment overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl Config {
    /// Apply environment overrides on top of the file config.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`; tests pass a map.
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get("OPENAI_MODEL") {
            self.agent.model = model;
        }
        if let Some(path) = get("AGENT_INSTRUCTIONS_FILE") {
            self.agent.instructions_file = PathBuf::from(path);
        }
        if let Some(region) = get("AWS_REGION") {
            self.managed_agent.region = region;
        }
        if let Some(id) = get("BEDROCK_AGENT_ID") {
            self.managed_agent.agent_id = id;
        }
        if let Some(alias) = get("BEDROCK_AGENT_ALIAS_ID") {
            self.managed_agent.agent_alias_id = alias;
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "ignoring unparsable PORT"),
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Credentials are not checked here: they are read at call time so a
    /// missing key fails only the requests that need it.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }

        if self.server.host.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }

        if self.openai.base_url.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "openai.base_url".into(),
                message: "base_url must not be empty".into(),
            });
        }

        if self.agent.model.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "agent.model".into(),
                message: "model must not be empty".into(),
            });
        }

        // The managed route still answers without these, just always with
        // a null reply.
        if self.managed_agent.agent_id.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "managed_agent.agent_id".into(),
                message: "no agent id configured; POST / will reply null".into(),
            });
        }
        if self.managed_agent.agent_alias_id.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "managed_agent.agent_alias_id".into(),
                message: "no agent alias id configured; POST / will reply null".into(),
            });
        }

        if self.sessions.max_sessions == 0 && self.sessions.idle_ttl_secs == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "sessions".into(),
                message: "both eviction limits disabled; transcripts grow without bound".into(),
            });
        }

        if self.sessions.idle_ttl_secs > 0 && self.sessions.sweep_interval_secs == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "sessions.sweep_interval_secs".into(),
                message: "sweep interval must be greater than 0 when idle_ttl_secs is set".into(),
            });
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "observability.sample_rate".into(),
                message: format!(
                    "sample rate {} is outside 0.0..=1.0",
                    self.observability.sample_rate
                ),
            });
        }

        errors
    }
}
