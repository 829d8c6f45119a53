//! Gateway configuration models.

pub mod config;

pub use config::{
    CacheConfig, EndpointClass, GatewayConfig, RateLimitConfig, RatePolicy, RetryConfig,
    ScanConfig,
};
