//! AWS Bedrock Agents runtime adapter.
//!
//! Invokes a hosted agent through the `InvokeAgent` REST operation with a
//! Bedrock API key (bearer token):
//!
//! ```text
//! POST {endpoint}/agents/{agentId}/agentAliases/{aliasId}/sessions/{sessionId}/text
//! {"inputText": "..."}
//! ```
//!
//! The answer arrives as an `application/vnd.amazon.eventstream` body whose
//! `chunk` events carry base64 text in `{"bytes": "..."}`. Any other content
//! type is passed through as raw text chunks.

use std::time::Instant;

use base64::Engine as _;
use relay_domain::config::ManagedAgentConfig;
use relay_domain::error::{Error, Result};
use relay_domain::stream::ChunkStream;
use serde_json::Value;

use crate::eventstream::{Frame, FrameDecoder};
use crate::traits::{AgentRuntime, InvokeAgentRequest};
use crate::util::{build_client, from_reqwest, resolve_credential};

const EVENTSTREAM_CONTENT_TYPE: &str = "application/vnd.amazon.eventstream";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct BedrockAgentRuntime {
    id: String,
    endpoint: String,
    token_env: String,
    client: reqwest::Client,
}

impl BedrockAgentRuntime {
    pub fn from_config(cfg: &ManagedAgentConfig) -> Result<Self> {
        Ok(Self {
            id: "bedrock_agent".into(),
            endpoint: cfg.endpoint(),
            token_env: cfg.token_env.clone(),
            client: build_client(cfg.request_timeout_ms)?,
        })
    }

    /// Build the invocation URL. Each id is pushed as its own path segment
    /// so caller-supplied session ids are percent-encoded.
    fn invoke_url(&self, req: &InvokeAgentRequest) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| Error::Config(format!("managed agent endpoint '{}': {e}", self.endpoint)))?;
        url.path_segments_mut()
            .map_err(|_| {
                Error::Config(format!(
                    "managed agent endpoint '{}' cannot carry a path",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend([
                "agents",
                req.agent_id.as_str(),
                "agentAliases",
                req.agent_alias_id.as_str(),
                "sessions",
                req.session_id.as_str(),
                "text",
            ]);
        Ok(url)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Event handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Map one decoded frame to the text bytes it carries.
///
/// `Ok(None)` for events that carry no completion text (traces, returned
/// control, unknown event types).
pub(crate) fn frame_to_chunk(provider: &str, frame: &Frame) -> Result<Option<Vec<u8>>> {
    match frame.header_str(":message-type") {
        Some("exception") => {
            let kind = frame.header_str(":exception-type").unwrap_or("exception");
            let detail = serde_json::from_slice::<Value>(&frame.payload)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| String::from_utf8_lossy(&frame.payload).into_owned());
            Err(Error::Provider {
                provider: provider.to_owned(),
                message: format!("{kind}: {detail}"),
            })
        }
        Some("error") => {
            let code = frame.header_str(":error-code").unwrap_or("error");
            let message = frame.header_str(":error-message").unwrap_or("");
            Err(Error::Provider {
                provider: provider.to_owned(),
                message: format!("{code}: {message}"),
            })
        }
        _ => match frame.header_str(":event-type") {
            Some("chunk") => {
                let body: Value = serde_json::from_slice(&frame.payload)
                    .map_err(|e| Error::Decode(format!("chunk event payload: {e}")))?;
                let Some(encoded) = body.get("bytes").and_then(|b| b.as_str()) else {
                    return Ok(None);
                };
                base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .map(Some)
                    .map_err(|e| Error::Decode(format!("chunk bytes: {e}")))
            }
            other => {
                tracing::debug!(provider, event_type = ?other, "skipping agent event");
                Ok(None)
            }
        },
    }
}

/// Turn an event-stream response body into a stream of text chunks.
fn eventstream_chunks(
    provider: String,
    first: Vec<u8>,
    mut response: reqwest::Response,
) -> ChunkStream {
    let stream = async_stream::stream! {
        let mut decoder = FrameDecoder::new();
        decoder.push(&first);

        'read: loop {
            loop {
                match decoder.next_frame() {
                    Ok(Some(frame)) => match frame_to_chunk(&provider, &frame) {
                        Ok(Some(bytes)) => yield Ok(bytes),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            break 'read;
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e);
                        break 'read;
                    }
                }
            }

            match response.chunk().await {
                Ok(Some(bytes)) => decoder.push(&bytes),
                Ok(None) => {
                    if !decoder.is_empty() {
                        yield Err(Error::Decode(format!(
                            "event stream ended inside a frame ({} bytes left)",
                            decoder.buffered()
                        )));
                    }
                    break;
                }
                Err(e) => {
                    yield Err(from_reqwest(e));
                    break;
                }
            }
        }
    };

    Box::pin(stream)
}

/// Pass a non-event-stream body through untouched, one network chunk at a time.
fn raw_chunks(first: Vec<u8>, mut response: reqwest::Response) -> ChunkStream {
    let stream = async_stream::stream! {
        yield Ok(first);
        loop {
            match response.chunk().await {
                Ok(Some(bytes)) => yield Ok(bytes.to_vec()),
                Ok(None) => break,
                Err(e) => {
                    yield Err(from_reqwest(e));
                    break;
                }
            }
        }
    };

    Box::pin(stream)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl AgentRuntime for BedrockAgentRuntime {
    async fn invoke_agent(&self, req: &InvokeAgentRequest) -> Result<Option<ChunkStream>> {
        let token = resolve_credential(&self.token_env)?;
        let url = self.invoke_url(req)?;

        tracing::debug!(
            runtime = %self.id,
            agent_id = %req.agent_id,
            session_id = %req.session_id,
            "invoking managed agent"
        );

        let started = Instant::now();
        let mut resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "inputText": req.input_text }))
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::ProviderStatus {
                provider: self.id.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let is_eventstream = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(EVENTSTREAM_CONTENT_TYPE));

        // An accepted call with an empty body has no completion stream.
        let first = match resp.chunk().await.map_err(from_reqwest)? {
            Some(bytes) => bytes.to_vec(),
            None => {
                tracing::debug!(
                    runtime = %self.id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "managed agent returned an empty body"
                );
                return Ok(None);
            }
        };

        let stream = if is_eventstream {
            eventstream_chunks(self.id.clone(), first, resp)
        } else {
            raw_chunks(first, resp)
        };
        Ok(Some(stream))
    }

    fn runtime_id(&self) -> &str {
        &self.id
    }
}
