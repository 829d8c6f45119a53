use base64::Engine as _;
use gembridge_types::protocol::openai::{ContentPart, MessageContent};
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::{GatewayError, GatewayResult};
use crate::proxy::common::media_detect::detect_image_mime;

/// Parts for one message. Null content is a single empty text part; a
/// message made only of images gets an empty text part appended.
pub async fn transform_message_content(
    content: Option<&MessageContent>,
    http: &Client,
) -> GatewayResult<Vec<Value>> {
    match content {
        None => Ok(vec![json!({ "text": "" })]),
        Some(MessageContent::Text(text)) => Ok(vec![json!({ "text": text })]),
        Some(MessageContent::Parts(blocks)) => {
            let mut parts = Vec::with_capacity(blocks.len() + 1);
            for block in blocks {
                parts.push(transform_content_part(block, http).await?);
            }
            if blocks.iter().all(|b| b.part_type == "image_url") {
                parts.push(json!({ "text": "" }));
            }
            Ok(parts)
        },
    }
}

pub async fn transform_content_part(part: &ContentPart, http: &Client) -> GatewayResult<Value> {
    match part.part_type.as_str() {
        "text" => Ok(json!({ "text": part.text.as_deref().unwrap_or_default() })),
        "image_url" => {
            let url = part
                .image_url
                .as_ref()
                .map(|u| u.url())
                .ok_or_else(|| GatewayError::InvalidRequest("image_url part without url".into()))?;
            if url.starts_with("data:") {
                parse_data_uri(url)
            } else if url.starts_with("http://") || url.starts_with("https://") {
                fetch_image(url, http).await
            } else {
                Err(GatewayError::InvalidRequest(format!("Unsupported image URL scheme: {}", url)))
            }
        },
        "input_audio" => {
            let audio = part.input_audio.as_ref().ok_or_else(|| {
                GatewayError::InvalidRequest("input_audio part without data".into())
            })?;
            Ok(json!({
                "inlineData": { "mimeType": format!("audio/{}", audio.format), "data": audio.data }
            }))
        },
        other => Err(GatewayError::UnknownContentType(other.to_string())),
    }
}

/// `data:<mime>[;base64],<payload>` → inline blob.
pub fn parse_data_uri(url: &str) -> GatewayResult<Value> {
    let rest = url.strip_prefix("data:").unwrap_or(url);
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| GatewayError::InvalidRequest("Malformed data URI".to_string()))?;
    let mime_type = meta.split(';').next().filter(|m| !m.is_empty()).unwrap_or("image/jpeg");
    Ok(json!({ "inlineData": { "mimeType": mime_type, "data": data } }))
}

async fn fetch_image(url: &str, http: &Client) -> GatewayResult<Value> {
    tracing::debug!("[OpenAI-Request] Fetching image: {}", url);
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|e| GatewayError::InvalidRequest(format!("Failed to fetch image {}: {}", url, e)))?;
    if !resp.status().is_success() {
        return Err(GatewayError::InvalidRequest(format!(
            "Failed to fetch image {}: HTTP {}",
            url,
            resp.status().as_u16()
        )));
    }
    let declared = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| GatewayError::InvalidRequest(format!("Failed to read image {}: {}", url, e)))?;

    let mime_type = detect_image_mime(&bytes, declared.as_deref());
    let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
    tracing::debug!("[OpenAI-Request] Inlined image ({} bytes, {})", bytes.len(), mime_type);
    Ok(json!({ "inlineData": { "mimeType": mime_type, "data": data } }))
}
