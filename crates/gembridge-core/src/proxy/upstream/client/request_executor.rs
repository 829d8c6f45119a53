use reqwest::{RequestBuilder, Response};
use std::time::Duration;

use super::super::error::UpstreamError;

/// `<root>/models/<model>:<action>[?query]`
pub fn build_model_url(api_root: &str, model: &str, action: &str, query: Option<&str>) -> String {
    match query {
        Some(qs) => format!("{}/models/{}:{}?{}", api_root, model, action, qs),
        None => format!("{}/models/{}:{}", api_root, model, action),
    }
}

/// Delay before attempt `attempt + 1`: `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt))
}

/// Send the request built by `build` up to `attempts` times.
///
/// Each attempt is bounded by `timeout` until response headers arrive. A
/// success is returned as-is, body unread, so callers can stream it.
pub async fn execute_with_retry<F>(
    build: F,
    attempts: u32,
    base_delay: Duration,
    timeout: Duration,
) -> Result<Response, UpstreamError>
where
    F: Fn() -> RequestBuilder,
{
    let attempts = attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        let outcome = match tokio::time::timeout(timeout, build().send()).await {
            Ok(Ok(resp)) if resp.status().is_success() => return Ok(resp),
            Ok(Ok(resp)) => {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                UpstreamError::Status { status, body }
            },
            Ok(Err(e)) => UpstreamError::from(e),
            Err(_) => UpstreamError::Transport(format!(
                "no response within {}s",
                timeout.as_secs_f32()
            )),
        };

        let is_last = attempt + 1 >= attempts;
        if is_last || !outcome.is_retryable() {
            if outcome.is_retryable() {
                tracing::error!("[Upstream] Giving up after {} attempts: {}", attempt + 1, outcome);
            } else {
                tracing::debug!("[Upstream] Non-retryable failure: {}", outcome);
            }
            return Err(outcome);
        }

        let delay = backoff_delay(base_delay, attempt);
        tracing::warn!(
            "[Upstream] Attempt {}/{} failed ({}), retrying in {}ms",
            attempt + 1,
            attempts,
            outcome,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
