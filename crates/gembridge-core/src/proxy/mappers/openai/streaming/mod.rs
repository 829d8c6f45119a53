mod event_translator;
mod line_framer;


use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tracing::debug;

pub use event_translator::EventTranslator;
pub use line_framer::{LineFramer, SsePayload};

/// Two-stage reframer for one upstream stream: bytes in, OpenAI SSE
/// records out. `finish` consumes it, so a reframer cannot be reused.
pub struct StreamReframer {
    framer: LineFramer,
    translator: EventTranslator,
}

impl StreamReframer {
    pub fn new(response_id: String, model: String, include_usage: bool) -> Self {
        Self { framer: LineFramer::new(), translator: EventTranslator::new(response_id, model, include_usage) }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let payloads = self.framer.push(chunk);
        payloads.iter().flat_map(|p| self.translator.translate(p)).collect()
    }

    pub fn finish(mut self) -> Vec<String> {
        let mut out = match self.framer.finish() {
            Some(rest) => self.translator.translate(&rest),
            None => Vec::new(),
        };
        out.extend(self.translator.flush());
        out
    }
}

/// Drive `reframer` over the upstream body. Dropping the returned stream
/// (client disconnect) drops the upstream body and aborts the fetch.
pub fn create_openai_sse_stream(
    mut gemini_stream: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    mut reframer: StreamReframer,
) -> Pin<Box<dyn Stream<Item = Result<Bytes, String>> + Send>> {
    let stream = async_stream::stream! {
        while let Some(item) = gemini_stream.next().await {
            match item {
                Ok(bytes) => {
                    debug!("[OpenAI-SSE] Received chunk: {} bytes", bytes.len());
                    for record in reframer.push(&bytes) {
                        yield Ok::<Bytes, String>(Bytes::from(record));
                    }
                },
                Err(e) => {
                    tracing::error!("[OpenAI-SSE] Upstream stream error: {}", e);
                    break;
                },
            }
        }
        for record in reframer.finish() {
            yield Ok::<Bytes, String>(Bytes::from(record));
        }
    };
    Box::pin(stream)
}
