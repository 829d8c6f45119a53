//! # gembridge Types
//!
//! Foundational types shared by the gateway crates:
//!
//! - **`error`** - Configuration error hierarchy
//! - **`models`** - Gateway configuration (`GatewayConfig` and its sections)
//! - **`protocol`** - OpenAI-compatible and Gemini wire types
//!
//! ## Architecture Role
//!
//! ```text
//!          gembridge-types (this crate)
//!                  │
//!                  ▼
//!           gembridge-core
//!                  │
//!                  ▼
//!          gembridge-server
//! ```
//!
//! Nothing in here performs I/O beyond reading a config file; everything is
//! serde-friendly and cheap to clone across async boundaries.

pub mod error;
pub mod models;
pub mod protocol;

pub use error::ConfigError;
pub use models::GatewayConfig;
