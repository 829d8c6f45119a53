//! Open CORS for browser clients.
//!
//! Preflights allow any request header so browsers can send the SDKs'
//! custom headers (`x-goog-api-key`, `x-stainless-*`). Regular responses
//! advertise only `Content-Type, Authorization`, the headers every
//! OpenAI-style client needs. `tower_http::cors::CorsLayer` applies one set
//! to both, so this is a plain middleware.

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const PREFLIGHT_ALLOW_HEADERS: &str = "*";
const RESPONSE_ALLOW_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE_SECS: &str = "86400";

/// Answers every preflight with 204 and stamps CORS headers on all other
/// responses, error bodies included.
pub async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut(), PREFLIGHT_ALLOW_HEADERS);
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut(), RESPONSE_ALLOW_HEADERS);
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, allow_headers: &'static str) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(allow_headers));
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use axum_test::TestServer;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(cors_middleware))
    }

    #[tokio::test]
    async fn test_preflight() {
        let server = TestServer::new(app()).unwrap();
        let response = server.method(Method::OPTIONS, "/anything").await;
        response.assert_status(StatusCode::NO_CONTENT);
        assert_eq!(response.header("access-control-allow-origin"), "*");
        assert_eq!(response.header("access-control-allow-headers"), "*");
        assert_eq!(response.header("access-control-allow-methods"), ALLOW_METHODS);
        assert_eq!(response.header("access-control-max-age"), "86400");
    }

    #[tokio::test]
    async fn test_regular_and_not_found_responses_carry_headers() {
        let server = TestServer::new(app()).unwrap();
        let response = server.get("/ok").await;
        response.assert_status_ok();
        assert_eq!(response.header("access-control-allow-headers"), RESPONSE_ALLOW_HEADERS);

        let response = server.get("/missing").await;
        response.assert_status_not_found();
        assert_eq!(response.header("access-control-allow-origin"), "*");
    }
}
