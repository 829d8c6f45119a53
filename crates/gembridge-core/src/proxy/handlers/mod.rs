// Handlers module - endpoint handlers
//
// Compat endpoints live under any path prefix, so routing is done on the
// classified payload kind rather than on the axum route table.

pub mod native;
pub mod openai;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{GatewayError, GatewayResult};
use crate::proxy::classifier::{PayloadKind, RequestContext};
use crate::proxy::server::AppState;

/// `GET /healthz`; sits outside admission, so no credential is needed.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Fallback handler for every admitted gateway request.
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let Some(ctx) = request.extensions().get::<RequestContext>().cloned() else {
        return GatewayError::Internal("request reached dispatch without admission".into())
            .into_response();
    };

    route(&state, ctx, request).await.unwrap_or_else(IntoResponse::into_response)
}

async fn route(state: &AppState, ctx: RequestContext, request: Request) -> GatewayResult<Response> {
    let limit = state.config.max_body_bytes;
    match ctx.payload_kind {
        PayloadKind::NativePassthrough => native::handle_passthrough(state, &ctx, request).await,
        PayloadKind::Chat => {
            expect_method(&request, Method::POST)?;
            let body = read_body(request.into_body(), limit).await?;
            openai::handle_chat_completions(state, ctx, body).await
        },
        PayloadKind::Embeddings => {
            expect_method(&request, Method::POST)?;
            let body = read_body(request.into_body(), limit).await?;
            openai::handle_embeddings(state, ctx, body).await
        },
        PayloadKind::ModelList => {
            expect_method(&request, Method::GET)?;
            openai::handle_list_models(state, ctx).await
        },
    }
}

fn expect_method(request: &Request, expected: Method) -> GatewayResult<()> {
    if *request.method() == expected {
        Ok(())
    } else {
        Err(GatewayError::MethodNotAllowed(request.method().to_string()))
    }
}

/// Buffer a request body up to `limit` bytes.
pub async fn read_body(body: Body, limit: usize) -> GatewayResult<Bytes> {
    // to_bytes only fails on the length limit or a dropped client, and a
    // dropped client never sees the response.
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::debug!("[Gateway] Body read failed: {}", e);
        GatewayError::PayloadTooLarge { limit }
    })
}
