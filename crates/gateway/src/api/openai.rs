//! `POST /openai` — one turn on the shared chat agent.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use relay_sessions::resolve_session_key;

use super::{rejected, RelayRequest};
use crate::state::AppState;

/// Replies `{ "reply": text }`. Any failure is a 500 carrying the error
/// text in `details`.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return rejected(rejection),
    };
    let session_key = resolve_session_key(body.session_id.as_deref());

    match state.chat_agent.invoke(body.message(), session_key).await {
        Ok(out) => Json(serde_json::json!({ "reply": out.reply })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, session_key, "chat turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Failed to get response from the chat agent",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
