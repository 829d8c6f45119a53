//! Standard HTTP header names used across the gateway.

/// Gemini's own credential header.
pub const X_GOOG_API_KEY: &str = "x-goog-api-key";
/// Explicit dialect hint; `native` forces passthrough.
pub const X_GEMBRIDGE_DIALECT: &str = "x-gembridge-dialect";
/// Policy size for the endpoint class that admitted the request.
pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
/// Requests left in the current window after this one.
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
/// Client library marker sent upstream.
pub const X_GOOG_API_CLIENT: &str = "x-goog-api-client";
pub const API_CLIENT_VALUE: &str = concat!("gembridge/", env!("CARGO_PKG_VERSION"));
