//! Stage A: split an SSE byte stream into `data:` payloads.

use crate::proxy::common::sse_parser::parse_sse_line;

const DELIMITERS: &[&[u8]] = &[b"\n\n", b"\r\n\r\n", b"\r\r"];

/// One extracted payload. `complete` is false only for bytes left over at
/// end of stream without a terminating blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsePayload {
    pub data: String,
    pub complete: bool,
}

#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and drain every complete record.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SsePayload> {
        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some((pos, len)) = find_record_end(&self.buffer) {
            let record: Vec<u8> = self.buffer.drain(..pos + len).take(pos).collect();
            if let Some(data) = extract_data(&String::from_utf8_lossy(&record)) {
                out.push(SsePayload { data, complete: true });
            }
        }
        out
    }

    /// Flush whatever is left. Non-blank leftovers are emitted even without
    /// `data:` framing so the translator can report them.
    pub fn finish(&mut self) -> Option<SsePayload> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        tracing::warn!("[OpenAI-SSE] Unterminated record at end of stream ({} bytes)", rest.len());
        let data = extract_data(trimmed).unwrap_or_else(|| trimmed.to_string());
        Some(SsePayload { data, complete: false })
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Earliest blank-line terminator: (start, length).
fn find_record_end(buf: &[u8]) -> Option<(usize, usize)> {
    DELIMITERS
        .iter()
        .filter_map(|d| buf.windows(d.len()).position(|w| w == *d).map(|pos| (pos, d.len())))
        .min_by_key(|(pos, _)| *pos)
}

/// Join the `data:` lines of one record; comments and other fields are skipped.
fn extract_data(record: &str) -> Option<String> {
    let lines: Vec<&str> = record
        .split(['\n', '\r'])
        .filter_map(parse_sse_line)
        .filter(|(key, _)| *key == "data")
        .map(|(_, value)| value)
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}
