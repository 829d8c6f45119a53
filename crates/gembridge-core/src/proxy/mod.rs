//! Proxy module - translation gateway service
//!
//! This module provides the gateway server with:
//! - Dialect classification and credential extraction
//! - Admission control (sliding-window rate limits, scan detection)
//! - OpenAI-compatible chat, embeddings and model listing over Gemini
//! - Native passthrough and realtime websocket relay

pub mod cache;
pub mod classifier;
pub mod common;
pub mod handlers;
pub mod mappers;
pub mod middleware;
pub mod realtime;
pub mod server;
pub mod upstream;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use cache::ResponseCache;
pub use classifier::{classify, CredentialSource, Dialect, PayloadKind, RequestContext};
pub use middleware::{RateLimiter, ScanDetector};
pub use server::{build_router, AppState, GatewayServer};
pub use upstream::{UpstreamClient, UpstreamError};

#[cfg(test)]
pub mod tests;
