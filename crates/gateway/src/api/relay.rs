//! `POST /` — relay a message to the managed agent runtime.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use relay_sessions::resolve_session_key;

use super::{rejected, RelayRequest};
use crate::runtime::build_user_content;
use crate::state::AppState;

/// Replies `{ "reply": text }`, or `{ "reply": null }` when the runtime
/// produced nothing. Invocation failures are logged by the adapter and
/// also come back as `null`; only a panic inside the adapter task becomes
/// a 500.
pub async fn relay(
    State(state): State<AppState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return rejected(rejection),
    };
    let session_key = resolve_session_key(body.session_id.as_deref());
    let prompt = build_user_content(body.message());

    let handle = tokio::spawn({
        let managed = state.managed.clone();
        let session_key = session_key.to_owned();
        async move { managed.invoke(&prompt, &session_key).await }
    });

    match handle.await {
        Ok(result) => {
            let reply = result.map(|c| c.completion);
            Json(serde_json::json!({ "reply": reply })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, session_key, "relay handler failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
