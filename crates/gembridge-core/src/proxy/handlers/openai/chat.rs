// OpenAI Chat Completions Handler
use super::*;
use axum::body::Body;
use axum::http::StatusCode;
use axum::Json;
use gembridge_types::protocol::gemini::GenerateContentResponse;
use gembridge_types::protocol::openai::ChatCompletionRequest;
use tracing::info;

use crate::proxy::common::generate_completion_id;
use crate::proxy::mappers::openai::{
    create_openai_sse_stream, resolve_chat_model, transform_openai_request,
    transform_openai_response, StreamReframer,
};

pub async fn handle_chat_completions(
    state: &AppState,
    ctx: RequestContext,
    body: Bytes,
) -> GatewayResult<Response> {
    let request: ChatCompletionRequest = serde_json::from_slice(&body)?;
    let ctx = ctx.with_target_model(resolve_chat_model(&request.model, &state.config.default_model));
    let model = ctx.target_model.clone().unwrap_or_default();

    info!(
        "[OpenAI] Chat request: requested='{}' resolved='{}' stream={} messages={}",
        request.model,
        model,
        request.stream,
        request.messages.len()
    );

    let gemini_body = transform_openai_request(&request, state.upstream.http()).await?;

    if request.stream {
        let resp = state.upstream.stream_generate_content(&ctx.credential, &model, &gemini_body).await?;
        let reframer = StreamReframer::new(generate_completion_id(), model, request.include_usage());
        let stream = create_openai_sse_stream(Box::pin(resp.bytes_stream()), reframer);
        return Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/event-stream"), (header::CACHE_CONTROL, "no-cache")],
            Body::from_stream(stream),
        )
            .into_response());
    }

    let resp = state.upstream.generate_content(&ctx.credential, &model, &gemini_body).await?;
    let gemini: GenerateContentResponse = read_upstream_json(resp).await?;
    Ok(Json(transform_openai_response(&gemini, &model)).into_response())
}
