// OpenAI mapper module
// Handles OpenAI ↔ Gemini protocol conversion

pub mod embeddings;
pub mod models;
pub mod request;
pub mod response;
pub mod streaming;

pub use embeddings::{build_batch_embed_request, transform_embeddings_response};
pub use models::{resolve_chat_model, resolve_embeddings_model, transform_models_list};
pub use request::transform_openai_request;
pub use response::{map_finish_reason, map_usage, transform_openai_response, TEXT_PART_SEPARATOR};
pub use streaming::{create_openai_sse_stream, StreamReframer};
