//! Stage B: Gemini stream events → OpenAI `chat.completion.chunk` records.
//!
//! Per candidate ordinal: the first event produces a preamble chunk, every
//! later event with text produces a delta chunk, and `flush` replays the
//! last event of each ordinal (first-seen order) as a terminal chunk
//! before the `[DONE]` sentinel.

use chrono::Utc;
use gembridge_types::protocol::gemini::{Candidate, Content, GenerateContentResponse, Part};
use gembridge_types::protocol::openai::Usage;
use serde_json::{json, Value};

use super::line_framer::SsePayload;
use crate::proxy::common::sse_parser::{sse_record, SSE_DONE};
use crate::proxy::mappers::openai::response::{map_finish_reason, map_usage, TEXT_PART_SEPARATOR};

pub struct EventTranslator {
    response_id: String,
    model: String,
    created: i64,
    include_usage: bool,
    last_events: Vec<(u32, Candidate)>,
    usage: Option<Usage>,
    flushed: bool,
}

impl EventTranslator {
    pub fn new(response_id: String, model: String, include_usage: bool) -> Self {
        Self {
            response_id,
            model,
            created: Utc::now().timestamp(),
            include_usage,
            last_events: Vec::new(),
            usage: None,
            flushed: false,
        }
    }

    pub fn translate(&mut self, payload: &SsePayload) -> Vec<String> {
        if !payload.complete {
            tracing::debug!("[OpenAI-SSE] Translating unterminated payload");
        }
        let event = parse_event(&payload.data);
        if let Some(meta) = &event.usage_metadata {
            self.usage = Some(map_usage(meta));
        }

        let mut candidates = event.candidates;
        if candidates.is_empty() {
            match event.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => {
                    tracing::warn!("[OpenAI-SSE] Prompt blocked upstream: {}", reason);
                    candidates.push(Candidate {
                        index: Some(0),
                        content: None,
                        finish_reason: Some("SAFETY".to_string()),
                    });
                },
                None => return Vec::new(),
            }
        }

        let mut out = Vec::new();
        for cand in candidates {
            let ordinal = cand.index.unwrap_or(0);
            let text = cand.texts().join(TEXT_PART_SEPARATOR);
            match self.last_events.iter().position(|(o, _)| *o == ordinal) {
                Some(pos) => {
                    if !text.is_empty() {
                        out.push(self.chunk(ordinal, json!({ "content": text }), None, false));
                    }
                    self.last_events[pos].1 = cand;
                },
                None => {
                    out.push(self.chunk(
                        ordinal,
                        json!({ "role": "assistant", "content": "" }),
                        None,
                        false,
                    ));
                    self.last_events.push((ordinal, cand));
                },
            }
        }
        out
    }

    /// Terminal chunks plus the sentinel. Subsequent calls return nothing.
    pub fn flush(&mut self) -> Vec<String> {
        if self.flushed {
            return Vec::new();
        }
        self.flushed = true;

        let mut out: Vec<String> = self
            .last_events
            .iter()
            .map(|(ordinal, cand)| {
                self.chunk(*ordinal, json!({}), map_finish_reason(cand.finish_reason.as_deref()), true)
            })
            .collect();
        out.push(SSE_DONE.to_string());
        out
    }

    fn chunk(&self, index: u32, delta: Value, finish_reason: Option<String>, terminal: bool) -> String {
        let mut obj = json!({
            "id": self.response_id,
            "object": "chat.completion.chunk",
            "created": self.created,
            "model": self.model,
            "choices": [{
                "index": index,
                "delta": delta,
                "logprobs": Value::Null,
                "finish_reason": finish_reason,
            }],
        });
        if self.include_usage {
            obj["usage"] = match (terminal, self.usage) {
                (true, Some(usage)) => json!(usage),
                _ => Value::Null,
            };
        }
        sse_record(&obj.to_string())
    }
}

/// Parse one payload; anything unparseable becomes an `error` candidate so
/// the client sees the failure in-band.
fn parse_event(data: &str) -> GenerateContentResponse {
    let value = match serde_json::from_str::<Value>(data) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("[OpenAI-SSE] Unparseable upstream event: {}", e);
            return error_event(e.to_string());
        },
    };
    if let Some(message) = value.get("error").and_then(|e| e.get("message")).and_then(Value::as_str) {
        tracing::warn!("[OpenAI-SSE] Upstream error event: {}", message);
        return error_event(message.to_string());
    }
    serde_json::from_value(value).unwrap_or_else(|e| error_event(e.to_string()))
}

fn error_event(message: String) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            index: None,
            content: Some(Content {
                role: None,
                parts: vec![Part { text: Some(message), other: Default::default() }],
            }),
            finish_reason: Some("error".to_string()),
        }],
        ..Default::default()
    }
}
