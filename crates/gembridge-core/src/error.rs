//! Unified error type for the gateway request path.
//!
//! Every failure a handler or middleware can produce ends up here, and the
//! `IntoResponse` impl is the single place that renders the OpenAI-style
//! error body.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    /// No credential in header, query or bearer token.
    #[error("No API key provided")]
    Unauthenticated,

    /// Admission rate limit for this identity and endpoint class.
    #[error("Rate limit exceeded for {endpoint}, retry after {retry_after_secs}s")]
    RateLimited { endpoint: String, retry_after_secs: u64 },

    /// Identity blocked by the scan detector.
    #[error("Access denied")]
    Forbidden,

    /// Malformed or semantically invalid payload.
    #[error("{0}")]
    InvalidRequest(String),

    /// Request body above the configured limit.
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// `response_format.type` the backend cannot express.
    #[error("Unsupported response_format.type: {0}")]
    UnsupportedFormat(String),

    /// Message content part with an unrecognised `type`.
    #[error("Unknown content part type: {0}")]
    UnknownContentType(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    /// Non-success status from the backend after retries.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Network failure talking to the backend after retries.
    #[error("Upstream transport error: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// HTTP status code surfaced to the client.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::RateLimited { .. } => 429,
            Self::Forbidden => 403,
            Self::InvalidRequest(_) | Self::UnsupportedFormat(_) | Self::UnknownContentType(_) => {
                400
            },
            Self::PayloadTooLarge { .. } => 413,
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::Upstream { status, .. } => *status,
            Self::Transport(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    /// Value of `error.type` in the response body.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "authentication_error",
            Self::RateLimited { .. } => "rate_limit_error",
            Self::Forbidden => "permission_error",
            Self::InvalidRequest(_)
            | Self::PayloadTooLarge { .. }
            | Self::UnsupportedFormat(_)
            | Self::UnknownContentType(_)
            | Self::MethodNotAllowed(_) => "invalid_request_error",
            Self::NotFound(_) => "not_found_error",
            Self::Upstream { .. } | Self::Transport(_) => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        if status.is_server_error() {
            tracing::error!("[Gateway] {} ({})", self, status.as_u16());
        } else {
            tracing::debug!("[Gateway] {} ({})", self, status.as_u16());
        }

        let body = json!({
            "error": {
                "message": self.to_string(),
                "type": self.error_type(),
                "status": status.as_u16(),
            }
        });
        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs, .. } = self {
            if let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, v);
            }
        }
        response
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidRequest(format!("Invalid JSON payload: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_codes() {
        assert_eq!(GatewayError::Unauthenticated.http_status_code(), 401);
        assert_eq!(
            GatewayError::RateLimited { endpoint: "chat".into(), retry_after_secs: 3 }
                .http_status_code(),
            429
        );
        assert_eq!(GatewayError::Forbidden.http_status_code(), 403);
        assert_eq!(GatewayError::UnsupportedFormat("xml".into()).http_status_code(), 400);
        assert_eq!(
            GatewayError::Upstream { status: 503, message: "busy".into() }.http_status_code(),
            503
        );
    }

    #[tokio::test]
    async fn test_error_body_shape_and_retry_after() {
        let response =
            GatewayError::RateLimited { endpoint: "chat".into(), retry_after_secs: 7 }
                .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "7");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["type"], "rate_limit_error");
        assert_eq!(body["error"]["status"], 429);
        assert!(body["error"]["message"].as_str().unwrap().contains("retry after 7s"));
    }
}
