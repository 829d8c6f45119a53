mod content_parts;
mod generation_config;


use gembridge_types::protocol::openai::ChatCompletionRequest;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::{GatewayError, GatewayResult};
pub use content_parts::{parse_data_uri, transform_content_part, transform_message_content};
pub use generation_config::build_generation_config;

const HARM_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_CIVIC_INTEGRITY",
];

/// Every harm category with blocking disabled.
pub fn safety_settings() -> Value {
    Value::Array(
        HARM_CATEGORIES
            .iter()
            .map(|c| json!({ "category": c, "threshold": "BLOCK_NONE" }))
            .collect(),
    )
}

/// Build a `generateContent` body from an OpenAI chat request.
///
/// Async because `image_url` parts pointing at http(s) URLs are fetched and
/// inlined; `http` is the shared client used for that.
pub async fn transform_openai_request(
    request: &ChatCompletionRequest,
    http: &Client,
) -> GatewayResult<Value> {
    if request.messages.is_empty() {
        return Err(GatewayError::InvalidRequest("messages must not be empty".to_string()));
    }

    // Validate the cheap parts before any image fetch.
    let generation_config = build_generation_config(request)?;

    let mut system_parts: Vec<Value> = Vec::new();
    let mut contents: Vec<Value> = Vec::new();

    for msg in &request.messages {
        let parts = transform_message_content(msg.content.as_ref(), http).await?;
        match msg.role.as_str() {
            "system" | "developer" => system_parts.extend(parts),
            "assistant" => contents.push(json!({ "role": "model", "parts": parts })),
            _ => contents.push(json!({ "role": "user", "parts": parts })),
        }
    }

    // Gemini rejects a request with a system instruction and no turns.
    if contents.is_empty() && !system_parts.is_empty() {
        contents.push(json!({ "role": "model", "parts": [{ "text": " " }] }));
    }

    let mut body = json!({
        "contents": contents,
        "safetySettings": safety_settings(),
        "generationConfig": generation_config,
    });
    if !system_parts.is_empty() {
        body["systemInstruction"] = json!({ "parts": system_parts });
    }

    tracing::debug!(
        "[OpenAI-Request] Transformed {} messages into {} turns (system parts: {})",
        request.messages.len(),
        body["contents"].as_array().map_or(0, Vec::len),
        system_parts.len()
    );
    Ok(body)
}
