use serde_json::Value;
use thiserror::Error;

use crate::error::GatewayError;

/// Failure of a single upstream exchange after retries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// No status was received (connect, TLS, timeout, reset).
    #[error("Upstream transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status.
    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl UpstreamError {
    /// Only transport failures and 5xx are worth another attempt; 4xx
    /// (including 429) goes straight back to the client.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Transport(msg) => GatewayError::Transport(msg),
            UpstreamError::Status { status, body } => {
                GatewayError::Upstream { status, message: upstream_message(&body) }
            },
        }
    }
}

/// Gemini wraps errors as `{"error": {"message": ...}}`; fall back to the raw body.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Upstream request failed".to_string()
            } else {
                body.to_string()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(UpstreamError::Transport("reset".into()).is_retryable());
        assert!(UpstreamError::Status { status: 502, body: String::new() }.is_retryable());
        assert!(!UpstreamError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(!UpstreamError::Status { status: 404, body: String::new() }.is_retryable());
    }

    #[test]
    fn test_into_gateway_error_extracts_message() {
        let err: GatewayError = UpstreamError::Status {
            status: 400,
            body: r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#
                .into(),
        }
        .into();
        assert_eq!(
            err,
            GatewayError::Upstream { status: 400, message: "API key not valid".into() }
        );

        let err: GatewayError = UpstreamError::Status { status: 503, body: "busy".into() }.into();
        assert_eq!(err, GatewayError::Upstream { status: 503, message: "busy".into() });
    }
}
