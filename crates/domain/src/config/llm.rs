use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat-completion provider (OpenAI-compatible)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "d_openai_url")]
    pub base_url: String,
    /// Environment variable holding the API key. Read on every call, so a
    /// missing key only fails the requests that need it.
    #[serde(default = "d_openai_key_env")]
    pub api_key_env: String,
    /// Optional request timeout. `None` waits for the provider indefinitely.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: d_openai_url(),
            api_key_env: d_openai_key_env(),
            request_timeout_ms: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Managed agent runtime (Bedrock Agents)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedAgentConfig {
    #[serde(default = "d_region")]
    pub region: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub agent_alias_id: String,
    /// Endpoint override. Defaults to the regional agent runtime endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the bearer token.
    #[serde(default = "d_bedrock_token_env")]
    pub token_env: String,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl Default for ManagedAgentConfig {
    fn default() -> Self {
        Self {
            region: d_region(),
            agent_id: String::new(),
            agent_alias_id: String::new(),
            base_url: None,
            token_env: d_bedrock_token_env(),
            request_timeout_ms: None,
        }
    }
}

impl ManagedAgentConfig {
    /// The effective runtime endpoint, without a trailing slash.
    pub fn endpoint(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => format!("https://bedrock-agent-runtime.{}.amazonaws.com", self.region),
        }
    }
}

fn d_openai_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn d_region() -> String {
    "eu-west-2".into()
}
fn d_bedrock_token_env() -> String {
    "AWS_BEARER_TOKEN_BEDROCK".into()
}
