//! # gembridge Core
//!
//! Translation gateway between OpenAI-compatible clients and the Gemini API.
//!
//! ## Architecture
//!
//! ```text
//! gembridge-core/src/proxy/
//! ├── classifier.rs   # dialect + credential detection (pure)
//! ├── middleware/     # CORS, admission (rate limiter + scan detector)
//! ├── cache.rs        # bounded TTL response cache
//! ├── mappers/        # OpenAI ↔ Gemini request/response/stream reshaping
//! ├── upstream/       # reqwest client with exponential-backoff retry
//! ├── handlers/       # chat, embeddings, models, native passthrough
//! ├── realtime/       # websocket relay state machine
//! └── server.rs       # Axum router and server
//! ```

#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::float_cmp))]

pub mod error;
pub mod modules;
pub mod proxy;

pub use error::{GatewayError, GatewayResult};
