//! Shared helpers for handlers, mappers and middleware.

pub mod client_builder;
pub mod fingerprint;
pub mod header_constants;
pub mod media_detect;
pub mod random_id;
pub mod sse_parser;

pub use fingerprint::credential_fingerprint;
pub use random_id::generate_completion_id;
