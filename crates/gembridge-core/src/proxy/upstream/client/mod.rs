mod request_executor;

#[cfg(test)]
mod tests;

use bytes::Bytes;
use gembridge_types::models::{GatewayConfig, RetryConfig};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::time::Duration;

use super::error::UpstreamError;
use crate::proxy::common::header_constants::{API_CLIENT_VALUE, X_GOOG_API_CLIENT, X_GOOG_API_KEY};

pub use request_executor::{backoff_delay, build_model_url};

/// Gemini REST client shared by every handler.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
    api_root: String,
    retry: RetryConfig,
    timeout: Duration,
}

impl UpstreamClient {
    /// Accepts a pre-built `reqwest::Client` so TLS setup happens once at startup.
    pub fn new(http_client: Client, config: &GatewayConfig) -> Self {
        Self {
            http_client,
            base_url: config.upstream_base_url.trim_end_matches('/').to_string(),
            api_root: config.api_root(),
            retry: config.retry.clone(),
            timeout: config.request_timeout(),
        }
    }

    pub fn http(&self) -> &Client {
        &self.http_client
    }

    /// Non-streaming `generateContent`.
    pub async fn generate_content(
        &self,
        credential: &str,
        model: &str,
        body: &Value,
    ) -> Result<Response, UpstreamError> {
        let url = build_model_url(&self.api_root, model, "generateContent", None);
        self.post_json(&url, credential, body, true).await
    }

    /// `streamGenerateContent?alt=sse`; the timeout covers headers only.
    pub async fn stream_generate_content(
        &self,
        credential: &str,
        model: &str,
        body: &Value,
    ) -> Result<Response, UpstreamError> {
        let url = build_model_url(&self.api_root, model, "streamGenerateContent", Some("alt=sse"));
        self.post_json(&url, credential, body, false).await
    }

    pub async fn batch_embed_contents(
        &self,
        credential: &str,
        model: &str,
        body: &Value,
    ) -> Result<Response, UpstreamError> {
        let url = build_model_url(&self.api_root, model, "batchEmbedContents", None);
        self.post_json(&url, credential, body, true).await
    }

    pub async fn list_models(&self, credential: &str) -> Result<Response, UpstreamError> {
        let url = format!("{}/models", self.api_root);
        let headers = Self::auth_headers(credential)?;
        let timeout = self.timeout;
        self.send(|| self.http_client.get(&url).headers(headers.clone()).timeout(timeout)).await
    }

    /// Forward a native request unchanged apart from headers already
    /// rewritten by the caller.
    pub async fn passthrough(
        &self,
        method: Method,
        path_and_query: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, UpstreamError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        tracing::debug!("[Upstream] Passthrough {} {}", method, path_and_query);
        self.send(|| {
            self.http_client
                .request(method.clone(), &url)
                .headers(headers.clone())
                .body(body.clone())
        })
        .await
    }

    /// Run one logical request through the retry policy.
    pub async fn send<F>(&self, build: F) -> Result<Response, UpstreamError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        request_executor::execute_with_retry(
            build,
            self.retry.attempts,
            self.retry.base_delay(),
            self.timeout,
        )
        .await
    }

    async fn post_json(
        &self,
        url: &str,
        credential: &str,
        body: &Value,
        bound_body: bool,
    ) -> Result<Response, UpstreamError> {
        let mut headers = Self::auth_headers(credential)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let payload = Bytes::from(
            serde_json::to_vec(body).map_err(|e| UpstreamError::Transport(e.to_string()))?,
        );
        let timeout = self.timeout;
        self.send(|| {
            let builder =
                self.http_client.post(url).headers(headers.clone()).body(payload.clone());
            if bound_body {
                builder.timeout(timeout)
            } else {
                builder
            }
        })
        .await
    }

    fn auth_headers(credential: &str) -> Result<HeaderMap, UpstreamError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(credential)
            .map_err(|_| UpstreamError::Status { status: 401, body: "Invalid API key".into() })?;
        headers.insert(X_GOOG_API_KEY, key);
        headers.insert(X_GOOG_API_CLIENT, HeaderValue::from_static(API_CLIENT_VALUE));
        Ok(headers)
    }
}
