//! Process-level helpers that sit outside the request path.

pub mod config;
