// OpenAI Embeddings Handler
use super::*;
use gembridge_types::protocol::gemini::BatchEmbedResponse;
use gembridge_types::protocol::openai::EmbeddingsRequest;

use crate::proxy::cache::embeddings_key;
use crate::proxy::common::credential_fingerprint;
use crate::proxy::mappers::openai::{
    build_batch_embed_request, resolve_embeddings_model, transform_embeddings_response,
};

pub async fn handle_embeddings(
    state: &AppState,
    ctx: RequestContext,
    body: Bytes,
) -> GatewayResult<Response> {
    let request: EmbeddingsRequest = serde_json::from_slice(&body)?;
    let ctx = ctx.with_target_model(resolve_embeddings_model(
        request.model.as_deref(),
        &state.config.default_embeddings_model,
    ));
    let model = ctx.target_model.clone().unwrap_or_default();
    let gemini_body = build_batch_embed_request(&request, &model)?;

    let cache_key = embeddings_key(&credential_fingerprint(&ctx.credential), &String::from_utf8_lossy(&body));
    if let Some(hit) = state.cache.get(&cache_key) {
        tracing::debug!("[OpenAI] Embeddings cache hit (model={})", model);
        return Ok(json_response(hit));
    }

    let resp = state.upstream.batch_embed_contents(&ctx.credential, &model, &gemini_body).await?;
    let upstream: BatchEmbedResponse = read_upstream_json(resp).await?;
    let serialized = serialize(&transform_embeddings_response(upstream, &model))?;
    state.cache.set(cache_key, serialized.clone(), state.config.cache.embeddings_ttl());
    Ok(json_response(serialized))
}
