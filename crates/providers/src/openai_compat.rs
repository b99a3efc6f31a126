//! OpenAI-compatible chat completions adapter.
//!
//! Works with OpenAI and any endpoint that follows the
//! `POST /chat/completions` contract.

use std::time::Instant;

use relay_domain::config::OpenAiConfig;
use relay_domain::error::{Error, Result};
use relay_domain::message::Turn;
use relay_domain::trace::TraceEvent;
use serde_json::Value;

use crate::traits::{ChatProvider, ChatRequest, ChatResponse};
use crate::util::{build_client, from_reqwest, resolve_credential};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A chat-completion provider for any OpenAI-compatible endpoint.
///
/// The API key is read from the environment on every call; constructing
/// the provider never needs it.
pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    api_key_env: String,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn from_config(cfg: &OpenAiConfig, default_model: &str) -> Result<Self> {
        Ok(Self {
            id: "openai".into(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key_env: cfg.api_key_env.clone(),
            default_model: default_model.to_owned(),
            client: build_client(cfg.request_timeout_ms)?,
        })
    }

    /// Resolve the effective model name for this request.
    fn effective_model(&self, req: &ChatRequest) -> String {
        req.model
            .clone()
            .unwrap_or_else(|| self.default_model.clone())
    }

    fn build_chat_body(&self, req: &ChatRequest) -> Value {
        let messages: Vec<Value> = req.messages.iter().map(turn_to_openai).collect();

        let mut body = serde_json::json!({
            "model": self.effective_model(req),
            "messages": messages,
        });
        if let Some(max) = req.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        body
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn turn_to_openai(turn: &Turn) -> Value {
    serde_json::json!({
        "role": turn.role.as_str(),
        "content": turn.content,
    })
}

/// Pull the reply out of a chat completion document.
///
/// A missing choice, message or content is an empty reply, not an error;
/// only a body that is not a JSON object is rejected.
fn parse_chat_response(body: Value, fallback_model: &str) -> Result<ChatResponse> {
    if !body.is_object() {
        return Err(Error::Decode(
            "chat completion response is not a JSON object".into(),
        ));
    }

    let choice = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first());

    let content = choice
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let finish_reason = choice
        .and_then(|c| c.get("finish_reason"))
        .and_then(|v| v.as_str())
        .map(String::from);

    let model = body
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or(fallback_model)
        .to_string();

    Ok(ChatResponse {
        content,
        model,
        finish_reason,
        raw: body,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl ChatProvider for OpenAiCompatProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        // Credentials first: a missing key must fail before anything is sent.
        let api_key = resolve_credential(&self.api_key_env)?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_chat_body(req);
        let model = self.effective_model(req);

        tracing::debug!(
            provider = %self.id,
            url = %url,
            messages = req.messages.len(),
            "chat completion request"
        );

        let started = Instant::now();
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        TraceEvent::LlmRequest {
            provider: self.id.clone(),
            model: model.clone(),
            status: status.as_u16(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();

        if !status.is_success() {
            return Err(Error::ProviderStatus {
                provider: self.id.clone(),
                status: status.as_u16(),
                body: resp_text,
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text).map_err(|e| {
            Error::Decode(format!("chat completion response is not JSON: {e}"))
        })?;
        parse_chat_response(resp_json, &model)
    }

    fn ensure_ready(&self) -> Result<()> {
        resolve_credential(&self.api_key_env).map(|_| ())
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
