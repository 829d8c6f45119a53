//! Native dialect passthrough.
//!
//! The request goes upstream untouched except for credential handling and
//! hop-by-hop headers; the response status, headers and body stream come
//! straight back.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use super::read_body;
use crate::error::{GatewayError, GatewayResult};
use crate::proxy::classifier::{CredentialSource, RequestContext};
use crate::proxy::common::header_constants::{X_GEMBRIDGE_DIALECT, X_GOOG_API_KEY};
use crate::proxy::server::AppState;
use crate::proxy::upstream::UpstreamError;

const HOP_BY_HOP: &[HeaderName] = &[
    header::CONNECTION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
    header::PROXY_AUTHENTICATE,
];

pub async fn handle_passthrough(
    state: &AppState,
    ctx: &RequestContext,
    request: Request,
) -> GatewayResult<Response> {
    let (parts, body) = request.into_parts();
    let body = read_body(body, state.config.max_body_bytes).await?;
    let target = forward_target(parts.uri.path(), parts.uri.query());
    let headers = forward_headers(&parts.headers, ctx)?;

    tracing::info!("[Native] {} {}", parts.method, parts.uri.path());

    match state.upstream.passthrough(parts.method, &target, headers, body).await {
        Ok(resp) => Ok(relay_response(resp)),
        Err(UpstreamError::Status { status, body }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
        },
        Err(e) => Err(GatewayError::from(e)),
    }
}

/// Path plus query with any `key` parameter removed.
pub fn forward_target(path: &str, query: Option<&str>) -> String {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return path.to_string();
    };
    let kept: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| k != "key")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        return path.to_string();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(kept).finish();
    format!("{}?{}", path, encoded)
}

/// Client headers minus host, connection, content-length, hop-by-hop and the
/// credential carrier; `x-goog-api-key` is set to the credential.
pub fn forward_headers(incoming: &HeaderMap, ctx: &RequestContext) -> GatewayResult<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        if *name == header::HOST
            || *name == header::CONTENT_LENGTH
            || *name == X_GEMBRIDGE_DIALECT
            || *name == X_GOOG_API_KEY
            || HOP_BY_HOP.contains(name)
            || (ctx.credential_source == CredentialSource::Bearer && *name == header::AUTHORIZATION)
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    let key = HeaderValue::from_str(&ctx.credential).map_err(|_| GatewayError::Unauthenticated)?;
    headers.insert(X_GOOG_API_KEY, key);
    Ok(headers)
}

fn relay_response(resp: reqwest::Response) -> Response {
    let status = resp.status();
    let mut headers = HeaderMap::with_capacity(resp.headers().len());
    for (name, value) in resp.headers() {
        if !HOP_BY_HOP.contains(name) && *name != header::CONTENT_LENGTH {
            headers.append(name.clone(), value.clone());
        }
    }
    let mut response = Response::new(Body::from_stream(resp.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::classifier::{Dialect, PayloadKind};

    fn ctx(source: CredentialSource) -> RequestContext {
        RequestContext {
            dialect: Dialect::Native,
            credential: "secret".into(),
            credential_source: source,
            target_model: None,
            payload_kind: PayloadKind::NativePassthrough,
        }
    }

    #[test]
    fn test_forward_target_strips_key() {
        assert_eq!(forward_target("/v1beta/models", None), "/v1beta/models");
        assert_eq!(forward_target("/v1beta/models", Some("key=abc")), "/v1beta/models");
        assert_eq!(
            forward_target("/v1beta/models/m:streamGenerateContent", Some("alt=sse&key=abc")),
            "/v1beta/models/m:streamGenerateContent?alt=sse"
        );
        assert_eq!(
            forward_target("/v1beta/models", Some("pageSize=10&pageToken=x")),
            "/v1beta/models?pageSize=10&pageToken=x"
        );
    }

    #[test]
    fn test_forward_headers() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::HOST, HeaderValue::from_static("localhost:8045"));
        incoming.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        incoming.insert(header::CONTENT_LENGTH, HeaderValue::from_static("2"));
        incoming.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        incoming.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        incoming.insert("x-custom", HeaderValue::from_static("1"));

        let out = forward_headers(&incoming, &ctx(CredentialSource::Bearer)).unwrap();
        assert!(out.get(header::HOST).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get(header::CONTENT_LENGTH).is_none());
        assert!(out.get(header::AUTHORIZATION).is_none());
        assert_eq!(out.get(X_GOOG_API_KEY).unwrap(), "secret");
        assert_eq!(out.get("x-custom").unwrap(), "1");
        assert_eq!(out.get(header::CONTENT_TYPE).unwrap(), "application/json");

        // Authorization is not the carrier here, so it is forwarded.
        let out = forward_headers(&incoming, &ctx(CredentialSource::QueryKey)).unwrap();
        assert!(out.get(header::AUTHORIZATION).is_some());
    }
}
