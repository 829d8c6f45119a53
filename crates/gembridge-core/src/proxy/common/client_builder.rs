use std::time::Duration;

/// Build the shared upstream HTTP client.
///
/// No overall timeout is set on the client: streaming bodies may run far
/// longer than a single request. Per-attempt deadlines are applied by the
/// upstream invoker instead.
pub fn build_http_client(connect_timeout: Duration) -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .tcp_nodelay(true)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}
