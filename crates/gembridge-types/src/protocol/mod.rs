//! Wire types for the two dialects the gateway speaks.
//!
//! - `openai` - OpenAI-compatible chat completions, embeddings and model listing
//! - `gemini` - Gemini `generateContent`, `batchEmbedContents` and `models` responses
//!
//! Gemini *requests* are assembled as `serde_json::Value` by the mappers;
//! only the response side is typed here.

pub mod gemini;
pub mod openai;
