use futures_util::StreamExt;
use relay_domain::config::ManagedAgentConfig;
use relay_domain::error::Error;
use relay_domain::stream::ChunkStream;
use relay_providers::eventstream::{encode_frame, HeaderValue};
use relay_providers::{AgentRuntime, BedrockAgentRuntime, InvokeAgentRequest};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENTSTREAM: &str = "application/vnd.amazon.eventstream";
const INVOKE_PATH: &str = "/agents/AGENT1/agentAliases/ALIAS1/sessions/s1/text";

fn runtime(server: &MockServer, token_env: &str) -> BedrockAgentRuntime {
    let cfg = ManagedAgentConfig {
        agent_id: "AGENT1".into(),
        agent_alias_id: "ALIAS1".into(),
        base_url: Some(server.uri()),
        token_env: token_env.into(),
        ..Default::default()
    };
    BedrockAgentRuntime::from_config(&cfg).unwrap()
}

fn request(input: &str) -> InvokeAgentRequest {
    InvokeAgentRequest {
        agent_id: "AGENT1".into(),
        agent_alias_id: "ALIAS1".into(),
        session_id: "s1".into(),
        input_text: input.into(),
    }
}

fn chunk_event(b64: &str) -> Vec<u8> {
    encode_frame(
        &[
            (":message-type", HeaderValue::String("event".into())),
            (":event-type", HeaderValue::String("chunk".into())),
            (":content-type", HeaderValue::String("application/json".into())),
        ],
        json!({ "bytes": b64 }).to_string().as_bytes(),
    )
}

async fn collect(mut stream: ChunkStream) -> Vec<Result<Vec<u8>, Error>> {
    let mut out = Vec::new();
    while let Some(item) = stream.next().await {
        out.push(item);
    }
    out
}

#[tokio::test]
async fn eventstream_chunks_are_base64_decoded_in_order() {
    let token_env = "RELAY_TEST_BEDROCK_TOKEN_CHUNKS";
    std::env::set_var(token_env, "bedrock-key");
    let server = MockServer::start().await;

    let mut body = chunk_event("SGU="); // "He"
    body.extend(encode_frame(
        &[
            (":message-type", HeaderValue::String("event".into())),
            (":event-type", HeaderValue::String("trace".into())),
        ],
        br#"{"trace":{}}"#,
    ));
    body.extend(chunk_event("bGxvIQ==")); // "llo!"

    Mock::given(method("POST"))
        .and(path(INVOKE_PATH))
        .and(header("authorization", "Bearer bedrock-key"))
        .and(body_json(json!({"inputText": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, EVENTSTREAM))
        .expect(1)
        .mount(&server)
        .await;

    let stream = runtime(&server, token_env)
        .invoke_agent(&request("hello"))
        .await
        .unwrap()
        .expect("stream");
    let chunks: Vec<Vec<u8>> = collect(stream)
        .await
        .into_iter()
        .map(|c| c.unwrap())
        .collect();
    assert_eq!(chunks, vec![b"He".to_vec(), b"llo!".to_vec()]);
}

#[tokio::test]
async fn plain_body_passes_through_as_raw_text() {
    let token_env = "RELAY_TEST_BEDROCK_TOKEN_RAW";
    std::env::set_var(token_env, "bedrock-key");
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INVOKE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain answer"))
        .mount(&server)
        .await;

    let stream = runtime(&server, token_env)
        .invoke_agent(&request("hello"))
        .await
        .unwrap()
        .expect("stream");
    let text: Vec<u8> = collect(stream)
        .await
        .into_iter()
        .flat_map(|c| c.unwrap())
        .collect();
    assert_eq!(text, b"plain answer");
}

#[tokio::test]
async fn empty_body_means_no_stream() {
    let token_env = "RELAY_TEST_BEDROCK_TOKEN_EMPTY";
    std::env::set_var(token_env, "bedrock-key");
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INVOKE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let stream = runtime(&server, token_env)
        .invoke_agent(&request("hello"))
        .await
        .unwrap();
    assert!(stream.is_none());
}

#[tokio::test]
async fn exception_event_ends_stream_with_provider_error() {
    let token_env = "RELAY_TEST_BEDROCK_TOKEN_EXCEPTION";
    std::env::set_var(token_env, "bedrock-key");
    let server = MockServer::start().await;

    let mut body = chunk_event("SGk="); // "Hi"
    body.extend(encode_frame(
        &[
            (":message-type", HeaderValue::String("exception".into())),
            (
                ":exception-type",
                HeaderValue::String("dependencyFailedException".into()),
            ),
        ],
        br#"{"message":"lambda failed"}"#,
    ));

    Mock::given(method("POST"))
        .and(path(INVOKE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, EVENTSTREAM))
        .mount(&server)
        .await;

    let stream = runtime(&server, token_env)
        .invoke_agent(&request("hello"))
        .await
        .unwrap()
        .expect("stream");
    let items = collect(stream).await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), b"Hi");
    match &items[1] {
        Err(Error::Provider { message, .. }) => {
            assert!(message.contains("dependencyFailedException"));
            assert!(message.contains("lambda failed"));
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[tokio::test]
async fn truncated_frame_is_decode_error() {
    let token_env = "RELAY_TEST_BEDROCK_TOKEN_TRUNCATED";
    std::env::set_var(token_env, "bedrock-key");
    let server = MockServer::start().await;

    let mut body = chunk_event("SGk=");
    let partial = chunk_event("SGk=");
    body.extend_from_slice(&partial[..partial.len() / 2]);

    Mock::given(method("POST"))
        .and(path(INVOKE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, EVENTSTREAM))
        .mount(&server)
        .await;

    let stream = runtime(&server, token_env)
        .invoke_agent(&request("hello"))
        .await
        .unwrap()
        .expect("stream");
    let items = collect(stream).await;
    assert!(items[0].is_ok());
    assert!(matches!(items.last(), Some(Err(Error::Decode(_)))));
}

#[tokio::test]
async fn non_success_status_is_provider_status_error() {
    let token_env = "RELAY_TEST_BEDROCK_TOKEN_STATUS";
    std::env::set_var(token_env, "bedrock-key");
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INVOKE_PATH))
        .respond_with(
            ResponseTemplate::new(403).set_body_string(r#"{"message":"not authorized"}"#),
        )
        .mount(&server)
        .await;

    let err = match runtime(&server, token_env).invoke_agent(&request("hello")).await {
        Err(e) => e,
        Ok(_) => panic!("expected an error"),
    };
    match err {
        Error::ProviderStatus { status, body, .. } => {
            assert_eq!(status, 403);
            assert!(body.contains("not authorized"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = runtime(&server, "RELAY_TEST_BEDROCK_TOKEN_UNSET_7070")
        .invoke_agent(&request("hello"))
        .await;
    assert!(matches!(result, Err(Error::Config(_))));
}
