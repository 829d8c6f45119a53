//! Gateway configuration.
//!
//! Every section has serde defaults, so an empty JSON object is a complete
//! config. Values are checked with `validator` after loading.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::Validate;

use crate::error::ConfigError;

/// Full gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address to bind
    #[validate(length(min = 1_u64))]
    pub host: String,
    /// Port to listen on
    #[validate(range(min = 1_u16))]
    pub port: u16,
    /// Base URL of the Gemini REST API (no trailing slash)
    #[validate(url)]
    pub upstream_base_url: String,
    /// Versioned path segment used for compat translations
    #[validate(length(min = 1_u64))]
    pub api_version: String,
    /// Base URL for realtime websocket sessions
    #[validate(url)]
    pub realtime_base_url: String,
    /// Model used when a compat request names a non-Gemini model
    #[validate(length(min = 1_u64))]
    pub default_model: String,
    /// Model used for embeddings when the request names a non-Gemini model
    #[validate(length(min = 1_u64))]
    pub default_embeddings_model: String,
    /// Per-attempt upstream timeout in seconds
    #[validate(range(min = 1_u64, max = 3600_u64))]
    pub request_timeout_secs: u64,
    /// Largest accepted request body
    #[validate(range(min = 1024_usize))]
    pub max_body_bytes: usize,
    /// Upstream retry policy
    #[validate(nested)]
    pub retry: RetryConfig,
    /// Admission rate limits
    #[validate(nested)]
    pub rate_limits: RateLimitConfig,
    /// Scan/abuse detector
    #[validate(nested)]
    pub scan: ScanConfig,
    /// Response cache
    #[validate(nested)]
    pub cache: CacheConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8045,
            upstream_base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_version: "v1beta".to_string(),
            realtime_base_url: "wss://generativelanguage.googleapis.com".to_string(),
            default_model: "gemini-2.5-flash".to_string(),
            default_embeddings_model: "text-embedding-004".to_string(),
            request_timeout_secs: 120,
            max_body_bytes: 20 * 1024 * 1024,
            retry: RetryConfig::default(),
            rate_limits: RateLimitConfig::default(),
            scan: ScanConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::from_json_error(&e))?;
        config.validated()
    }

    /// Run `validator` checks, consuming and returning the config.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate().map_err(|e| ConfigError::from_validation(&e))?;
        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `<upstream_base_url>/<api_version>`
    pub fn api_root(&self) -> String {
        format!("{}/{}", self.upstream_base_url.trim_end_matches('/'), self.api_version)
    }
}

/// Exponential backoff settings for upstream calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one
    #[validate(range(min = 1_u32, max = 10_u32))]
    pub attempts: u32,
    /// Delay before the second attempt; doubled for each further one
    #[validate(range(max = 60_000_u64))]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { attempts: 3, base_delay_ms: 500 }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Endpoint classes that carry independent rate policies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EndpointClass {
    Chat,
    Embeddings,
    Models,
    Native,
}

impl EndpointClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Embeddings => "embeddings",
            Self::Models => "models",
            Self::Native => "native",
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sliding-window policy: at most `max` requests per `window_ms`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RatePolicy {
    #[validate(range(min = 1_u32))]
    pub max: u32,
    #[validate(range(min = 1_u64))]
    pub window_ms: u64,
}

impl RatePolicy {
    pub const fn per_minute(max: u32) -> Self {
        Self { max, window_ms: 60_000 }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// One policy per endpoint class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct RateLimitConfig {
    #[validate(nested)]
    pub chat: RatePolicy,
    #[validate(nested)]
    pub embeddings: RatePolicy,
    #[validate(nested)]
    pub models: RatePolicy,
    #[validate(nested)]
    pub native: RatePolicy,
    /// Identity/class windows kept before the least active are trimmed
    #[validate(range(min = 1_usize))]
    pub max_tracked_identities: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            chat: RatePolicy::per_minute(60),
            embeddings: RatePolicy::per_minute(100),
            models: RatePolicy::per_minute(30),
            native: RatePolicy::per_minute(120),
            max_tracked_identities: 10_000,
        }
    }
}

impl RateLimitConfig {
    pub fn policy(&self, class: EndpointClass) -> RatePolicy {
        match class {
            EndpointClass::Chat => self.chat,
            EndpointClass::Embeddings => self.embeddings,
            EndpointClass::Models => self.models,
            EndpointClass::Native => self.native,
        }
    }
}

/// Scan detector thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct ScanConfig {
    /// Distinct sensitive paths within `window_secs` that trigger a block
    #[validate(range(min = 1_usize))]
    pub threshold: usize,
    #[validate(range(min = 1_u64))]
    pub window_secs: u64,
    #[validate(range(min = 1_u64))]
    pub block_secs: u64,
    /// Per-identity path history bound
    #[validate(range(min = 1_usize))]
    pub history_limit: usize,
    #[validate(range(min = 1_usize))]
    pub max_tracked_identities: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            window_secs: 60,
            block_secs: 3600,
            history_limit: 100,
            max_tracked_identities: 10_000,
        }
    }
}

impl ScanConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn block_duration(&self) -> Duration {
        Duration::from_secs(self.block_secs)
    }
}

/// Response cache sizing and TTLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct CacheConfig {
    #[validate(range(min = 1_usize))]
    pub capacity: usize,
    pub models_ttl_secs: u64,
    pub embeddings_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1000, models_ttl_secs: 3600, embeddings_ttl_secs: 300 }
    }
}

impl CacheConfig {
    pub fn models_ttl(&self) -> Duration {
        Duration::from_secs(self.models_ttl_secs)
    }

    pub fn embeddings_ttl(&self) -> Duration {
        Duration::from_secs(self.embeddings_ttl_secs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_yields_defaults() {
        let config = GatewayConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.api_root(), "https://generativelanguage.googleapis.com/v1beta");
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = GatewayConfig::from_json_str(
            r#"{"port": 9000, "rate_limits": {"chat": {"max": 5, "window_ms": 1000}}}"#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.rate_limits.policy(EndpointClass::Chat), RatePolicy {
            max: 5,
            window_ms: 1000
        });
        assert_eq!(config.rate_limits.embeddings, RatePolicy::per_minute(100));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = GatewayConfig::from_json_str(r#"{"retry": {"attempts": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }), "got {err:?}");
    }

    #[test]
    fn test_bad_upstream_url_rejected() {
        let err = GatewayConfig::from_json_str(r#"{"upstream_base_url": "not a url"}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "upstream_base_url"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = GatewayConfig::from_json_str("{port:").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
