// OpenAI models listing
use super::*;
use gembridge_types::protocol::gemini::ModelsResponse;

use crate::proxy::cache::models_key;
use crate::proxy::common::credential_fingerprint;
use crate::proxy::mappers::openai::transform_models_list;

/// Upstream model list, cached per credential.
pub async fn handle_list_models(state: &AppState, ctx: RequestContext) -> GatewayResult<Response> {
    let cache_key = models_key(&credential_fingerprint(&ctx.credential));
    if let Some(hit) = state.cache.get(&cache_key) {
        tracing::debug!("[OpenAI] Models cache hit");
        return Ok(json_response(hit));
    }

    let resp = state.upstream.list_models(&ctx.credential).await?;
    let upstream: ModelsResponse = read_upstream_json(resp).await?;
    let serialized = serialize(&transform_models_list(&upstream))?;
    state.cache.set(cache_key, serialized.clone(), state.config.cache.models_ttl());
    Ok(json_response(serialized))
}
