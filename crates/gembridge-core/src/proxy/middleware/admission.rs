//! Admission control: scan detection, classification and rate limiting.
//!
//! Runs in front of every gateway route except health checks. Blocked
//! identities are rejected before their request is classified, so a scanner
//! never learns whether its credential was valid.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::error::GatewayError;
use crate::proxy::classifier::classify;
use crate::proxy::common::credential_fingerprint;
use crate::proxy::common::header_constants::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING};
use crate::proxy::server::AppState;

pub const UNKNOWN_IDENTITY: &str = "unknown";

fn is_health_check(path: &str) -> bool {
    path == "/healthz"
}

pub async fn admission_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_health_check(&path) {
        return next.run(request).await;
    }

    let identity = client_identity(&request);
    let target = request.uri().path_and_query().map_or(path.as_str(), |pq| pq.as_str());
    state.scan_detector.record(&identity, target);
    if state.scan_detector.is_attack(&identity) {
        tracing::warn!("[Admission] Rejecting blocked identity {} on {}", identity, path);
        return GatewayError::Forbidden.into_response();
    }

    let ctx = match classify(request.headers(), &path, request.uri().query()) {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response(),
    };

    let admission = match state.rate_limiter.check(&identity, ctx.endpoint_class()) {
        Ok(admission) => admission,
        Err(e) => return e.into_response(),
    };

    tracing::debug!(
        "[Admission] {} {} dialect={:?} kind={:?} key={} remaining={}",
        request.method(),
        path,
        ctx.dialect,
        ctx.payload_kind,
        credential_fingerprint(&ctx.credential),
        admission.remaining
    );

    request.extensions_mut().insert(ctx);
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(admission.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(admission.remaining));
    response
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the peer address.
pub fn client_identity(request: &Request) -> String {
    let headers = request.headers();
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().uri("/v1/models");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_identity_precedence() {
        assert_eq!(
            client_identity(&request(&[
                ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
                ("x-real-ip", "10.0.0.9")
            ])),
            "10.0.0.1"
        );
        assert_eq!(client_identity(&request(&[("x-real-ip", "10.0.0.9")])), "10.0.0.9");

        let mut req = request(&[]);
        req.extensions_mut().insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 5], 4000))));
        assert_eq!(client_identity(&req), "192.168.1.5");

        assert_eq!(client_identity(&request(&[])), UNKNOWN_IDENTITY);
    }
}
