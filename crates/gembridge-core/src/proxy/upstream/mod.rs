//! Upstream module - Gemini API client with bounded retry

pub mod client;
pub mod error;

pub use client::UpstreamClient;
pub use error::UpstreamError;
