// OpenAI-compatible API handlers

mod chat;
mod embeddings;
mod models;

pub use chat::handle_chat_completions;
pub use embeddings::handle_embeddings;
pub use models::handle_list_models;

// Shared imports for submodules
use axum::{
    body::Bytes,
    http::header,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::error::{GatewayError, GatewayResult};
use crate::proxy::classifier::RequestContext;
use crate::proxy::server::AppState;

/// Already-serialized JSON body, as stored in the response cache.
fn json_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Decode a successful upstream body; a malformed one is a gateway-side failure.
async fn read_upstream_json<T: DeserializeOwned>(resp: reqwest::Response) -> GatewayResult<T> {
    let status = resp.status().as_u16();
    let bytes = resp.bytes().await.map_err(|e| GatewayError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::error!("[OpenAI] Unexpected upstream body (status {}): {}", status, e);
        GatewayError::Upstream { status: 502, message: format!("Invalid upstream response: {}", e) }
    })
}

fn serialize<T: serde::Serialize>(value: &T) -> GatewayResult<String> {
    serde_json::to_string(value).map_err(|e| GatewayError::Internal(e.to_string()))
}
