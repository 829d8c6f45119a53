use chrono::Utc;
use gembridge_types::protocol::gemini::{Candidate, GenerateContentResponse, UsageMetadata};
use gembridge_types::protocol::openai::{ChatCompletionResponse, Choice, ResponseMessage, Usage};

use crate::proxy::common::generate_completion_id;

/// Joins multi-part candidate text.
pub const TEXT_PART_SEPARATOR: &str = "\n\n|>";

pub fn map_finish_reason(reason: Option<&str>) -> Option<String> {
    reason.map(|r| {
        match r {
            "STOP" => "stop",
            "MAX_TOKENS" => "length",
            "SAFETY" | "RECITATION" => "content_filter",
            other => other,
        }
        .to_string()
    })
}

pub fn map_usage(meta: &UsageMetadata) -> Usage {
    Usage {
        prompt_tokens: meta.prompt_token_count,
        completion_tokens: meta.candidates_token_count,
        total_tokens: meta.total_token_count,
    }
}

/// Text parts joined with the separator; `None` when the candidate has no content.
pub fn candidate_text(candidate: &Candidate) -> Option<String> {
    candidate.content.as_ref()?;
    Some(candidate.texts().join(TEXT_PART_SEPARATOR))
}

pub fn transform_openai_response(
    gemini: &GenerateContentResponse,
    resolved_model: &str,
) -> ChatCompletionResponse {
    let mut choices: Vec<Choice> = gemini
        .candidates
        .iter()
        .enumerate()
        .map(|(pos, cand)| Choice {
            index: cand.index.unwrap_or(pos as u32),
            message: ResponseMessage {
                role: "assistant".to_string(),
                content: candidate_text(cand),
            },
            logprobs: None,
            finish_reason: map_finish_reason(cand.finish_reason.as_deref()),
        })
        .collect();

    if choices.is_empty() {
        if let Some(reason) = gemini.block_reason() {
            tracing::warn!("[OpenAI-Response] Prompt blocked upstream: {}", reason);
            choices.push(Choice {
                index: 0,
                message: ResponseMessage { role: "assistant".to_string(), content: None },
                logprobs: None,
                finish_reason: Some("content_filter".to_string()),
            });
        }
    }

    ChatCompletionResponse {
        id: generate_completion_id(),
        object: "chat.completion".to_string(),
        created: Utc::now().timestamp(),
        model: gemini.model_version.clone().unwrap_or_else(|| resolved_model.to_string()),
        choices,
        usage: gemini.usage_metadata.as_ref().map(map_usage),
    }
}
