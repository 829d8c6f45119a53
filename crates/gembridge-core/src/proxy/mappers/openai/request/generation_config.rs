use gembridge_types::protocol::openai::{ChatCompletionRequest, ResponseFormat};
use serde_json::{json, Map, Value};

use crate::error::{GatewayError, GatewayResult};

/// Map sampling parameters onto `generationConfig`; only fields the client
/// set are emitted.
pub fn build_generation_config(request: &ChatCompletionRequest) -> GatewayResult<Value> {
    let mut config = Map::new();

    if let Some(stop) = &request.stop {
        match stop {
            Value::String(s) => {
                config.insert("stopSequences".into(), json!([s]));
            },
            Value::Array(_) => {
                config.insert("stopSequences".into(), stop.clone());
            },
            _ => {},
        }
    }
    // Gemini rejects candidateCount on streaming calls.
    if let Some(n) = request.n.filter(|_| !request.stream) {
        config.insert("candidateCount".into(), json!(n));
    }
    if let Some(max) = request.max_completion_tokens.or(request.max_tokens) {
        config.insert("maxOutputTokens".into(), json!(max));
    }
    if let Some(t) = request.temperature {
        config.insert("temperature".into(), json!(t));
    }
    if let Some(p) = request.top_p {
        config.insert("topP".into(), json!(p));
    }
    if let Some(k) = request.top_k {
        config.insert("topK".into(), json!(k));
    }
    if let Some(fp) = request.frequency_penalty {
        config.insert("frequencyPenalty".into(), json!(fp));
    }
    if let Some(pp) = request.presence_penalty {
        config.insert("presencePenalty".into(), json!(pp));
    }
    if let Some(seed) = request.seed {
        config.insert("seed".into(), json!(seed));
    }
    if let Some(format) = &request.response_format {
        apply_response_format(&mut config, format)?;
    }

    Ok(Value::Object(config))
}

fn apply_response_format(config: &mut Map<String, Value>, format: &ResponseFormat) -> GatewayResult<()> {
    let mime_type = match format.format_type.as_str() {
        "json_schema" => {
            let schema = format.json_schema.as_ref().and_then(|s| s.schema.clone());
            let is_enum = schema.as_ref().is_some_and(|s| s.get("enum").is_some());
            if let Some(schema) = schema {
                config.insert("responseSchema".into(), schema);
            }
            if is_enum {
                "text/x.enum"
            } else {
                "application/json"
            }
        },
        "json_object" => "application/json",
        "text" => "text/plain",
        other => return Err(GatewayError::UnsupportedFormat(other.to_string())),
    };
    config.insert("responseMimeType".into(), json!(mime_type));
    Ok(())
}
