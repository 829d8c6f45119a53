//! Typed error definitions shared across gembridge crates.
//!
//! Request-path errors live next to the HTTP boundary in `gembridge-core`;
//! this crate only carries errors that can surface before a server exists.

mod config;

pub use config::ConfigError;
