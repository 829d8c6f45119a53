use super::*;
use gembridge_types::models::GatewayConfig;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base_url: &str) -> UpstreamClient {
    let config = GatewayConfig {
        upstream_base_url: base_url.to_string(),
        retry: RetryConfig { attempts: 3, base_delay_ms: 1 },
        request_timeout_secs: 5,
        ..GatewayConfig::default()
    };
    UpstreamClient::new(Client::new(), &config)
}

#[test]
fn test_build_model_url() {
    let root = "https://generativelanguage.googleapis.com/v1beta";
    assert_eq!(
        build_model_url(root, "gemini-2.5-flash", "generateContent", None),
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
    );
    assert_eq!(
        build_model_url(root, "gemini-2.5-flash", "streamGenerateContent", Some("alt=sse")),
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
    );
}

#[test]
fn test_backoff_doubles() {
    let base = Duration::from_millis(500);
    assert_eq!(backoff_delay(base, 0), Duration::from_millis(500));
    assert_eq!(backoff_delay(base, 1), Duration::from_millis(1000));
    assert_eq!(backoff_delay(base, 2), Duration::from_millis(2000));
}

#[tokio::test]
async fn test_sends_credential_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let resp = client.generate_content("secret", "gemini-2.5-flash", &json!({})).await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn test_stream_uses_alt_sse() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: {}\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let resp =
        client.stream_generate_content("k", "gemini-2.5-flash", &json!({})).await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "data: {}\n\n");
}

#[tokio::test]
async fn test_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let resp = client.list_models("k").await.unwrap();
    assert!(resp.status().is_success());
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    for status in [400_u16, 401, 429] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let err = client.list_models("k").await.unwrap_err();
        assert_eq!(err, UpstreamError::Status { status, body: "nope".into() });
    }
}

#[tokio::test]
async fn test_last_server_error_propagates_after_exhaustion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let err = client.list_models("k").await.unwrap_err();
    assert_eq!(err, UpstreamError::Status { status: 500, body: "boom".into() });
}

#[tokio::test]
async fn test_transport_error_after_retries() {
    // Nothing listens on port 1.
    let client = client_for("http://127.0.0.1:1");
    let err = client.list_models("k").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Transport(_)));
}

#[tokio::test]
async fn test_passthrough_forwards_method_path_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-pro:countTokens"))
        .and(query_param("alt", "json"))
        .and(header("x-goog-api-key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"totalTokens\":3}"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let mut headers = HeaderMap::new();
    headers.insert(X_GOOG_API_KEY, HeaderValue::from_static("k"));
    let resp = client
        .passthrough(
            Method::POST,
            "/v1beta/models/gemini-pro:countTokens?alt=json",
            headers,
            Bytes::from_static(b"{}"),
        )
        .await
        .unwrap();
    assert_eq!(resp.text().await.unwrap(), "{\"totalTokens\":3}");
}
