pub mod health;
pub mod openai;
pub mod relay;

use axum::extract::rejection::JsonRejection;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Build the relay router.
///
/// CORS is fully permissive: every origin may call every route.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(relay::relay).options(preflight))
        .route("/openai", post(openai::chat).options(preflight))
        .route("/health", get(health::health))
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// `OPTIONS` on a relay route: empty success.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request shape
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Body shared by both relay routes: `{ "msg": ..., "sessionId": "..." }`.
#[derive(Debug, Default, Deserialize)]
pub struct RelayRequest {
    /// A string, or an object of form answers, or absent.
    #[serde(default)]
    pub msg: Option<Value>,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

impl RelayRequest {
    pub fn message(&self) -> &Value {
        self.msg.as_ref().unwrap_or(&Value::Null)
    }
}

/// A body the JSON extractor refused, in the `{ "error": ... }` envelope.
/// The extractor's status (400, 415 or 422) is kept.
pub(crate) fn rejected(rejection: JsonRejection) -> Response {
    tracing::debug!(status = %rejection.status(), "request body rejected");
    (
        rejection.status(),
        Json(serde_json::json!({ "error": rejection.body_text() })),
    )
        .into_response()
}
