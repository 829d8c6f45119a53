use gembridge_types::protocol::gemini::BatchEmbedResponse;
use gembridge_types::protocol::openai::{EmbeddingData, EmbeddingsRequest, EmbeddingsResponse};
use serde_json::{json, Value};

use crate::error::{GatewayError, GatewayResult};

/// Build a `batchEmbedContents` body, one request per input item.
///
/// A scalar `input` is treated as a one-element batch.
pub fn build_batch_embed_request(request: &EmbeddingsRequest, model: &str) -> GatewayResult<Value> {
    let inputs: Vec<&Value> = match &request.input {
        Value::Array(items) => items.iter().collect(),
        Value::Null => {
            return Err(GatewayError::InvalidRequest("input is required".to_string()));
        },
        scalar => vec![scalar],
    };

    let model_ref = format!("models/{}", model);
    let requests: Vec<Value> = inputs
        .into_iter()
        .map(|item| {
            let text = match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let mut req = json!({
                "model": &model_ref,
                "content": { "parts": [{ "text": text }] },
            });
            if let Some(dims) = request.dimensions {
                req["outputDimensionality"] = json!(dims);
            }
            req
        })
        .collect();

    Ok(json!({ "requests": requests }))
}

pub fn transform_embeddings_response(upstream: BatchEmbedResponse, model: &str) -> EmbeddingsResponse {
    let data = upstream
        .embeddings
        .into_iter()
        .enumerate()
        .map(|(index, e)| EmbeddingData {
            object: "embedding".to_string(),
            index,
            embedding: e.values,
        })
        .collect();
    EmbeddingsResponse { object: "list".to_string(), data, model: model.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gembridge_types::protocol::gemini::ContentEmbedding;

    fn request(input: Value, dimensions: Option<u32>) -> EmbeddingsRequest {
        EmbeddingsRequest { model: None, input, dimensions }
    }

    #[test]
    fn test_scalar_input_becomes_single_request() {
        let body =
            build_batch_embed_request(&request(json!("hello"), None), "text-embedding-004").unwrap();
        let requests = body["requests"].as_array().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["model"], "models/text-embedding-004");
        assert_eq!(requests[0]["content"]["parts"][0]["text"], "hello");
        assert!(requests[0].get("outputDimensionality").is_none());
    }

    #[test]
    fn test_array_input_with_dimensions() {
        let body =
            build_batch_embed_request(&request(json!(["a", "b", "c"]), Some(256)), "m").unwrap();
        let requests = body["requests"].as_array().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2]["content"]["parts"][0]["text"], "c");
        assert_eq!(requests[1]["outputDimensionality"], 256);
    }

    #[test]
    fn test_missing_input_is_rejected() {
        let err = build_batch_embed_request(&request(Value::Null, None), "m").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }

    #[test]
    fn test_response_keeps_order() {
        let upstream = BatchEmbedResponse {
            embeddings: vec![
                ContentEmbedding { values: vec![0.1, 0.2] },
                ContentEmbedding { values: vec![0.3] },
            ],
        };
        let resp = transform_embeddings_response(upstream, "text-embedding-004");
        assert_eq!(resp.object, "list");
        assert_eq!(resp.model, "text-embedding-004");
        assert_eq!(resp.data[0].index, 0);
        assert_eq!(resp.data[1].index, 1);
        assert_eq!(resp.data[1].embedding, vec![0.3]);
        assert_eq!(resp.data[0].object, "embedding");
    }
}
