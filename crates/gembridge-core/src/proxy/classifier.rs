//! Dialect and credential detection.
//!
//! `classify` is pure: it only looks at headers, path and query, so every
//! routing decision the gateway makes can be tested without I/O.

use axum::http::{header, HeaderMap};
use gembridge_types::models::EndpointClass;

use crate::error::{GatewayError, GatewayResult};
use crate::proxy::common::header_constants::{X_GEMBRIDGE_DIALECT, X_GOOG_API_KEY};

/// Path prefixes that only the native API uses.
const NATIVE_PREFIXES: &[&str] = &["/v1beta/", "/v1alpha/", "/upload/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Native,
    Compat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Chat,
    Embeddings,
    ModelList,
    NativePassthrough,
}

/// Where the credential was found; passthrough strips that carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    NativeHeader,
    QueryKey,
    Bearer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub dialect: Dialect,
    pub credential: String,
    pub credential_source: CredentialSource,
    pub target_model: Option<String>,
    pub payload_kind: PayloadKind,
}

impl RequestContext {
    pub fn endpoint_class(&self) -> EndpointClass {
        match self.payload_kind {
            PayloadKind::Chat => EndpointClass::Chat,
            PayloadKind::Embeddings => EndpointClass::Embeddings,
            PayloadKind::ModelList => EndpointClass::Models,
            PayloadKind::NativePassthrough => EndpointClass::Native,
        }
    }

    /// Copy of this context with the resolved upstream model attached.
    #[must_use]
    pub fn with_target_model(&self, model: impl Into<String>) -> Self {
        Self { target_model: Some(model.into()), ..self.clone() }
    }
}

/// Classify an inbound request.
///
/// Credential precedence: `x-goog-api-key` header, then (native requests
/// only) the `key` query parameter, then the `Authorization` bearer value.
pub fn classify(headers: &HeaderMap, path: &str, query: Option<&str>) -> GatewayResult<RequestContext> {
    let native_key = header_str(headers, X_GOOG_API_KEY).filter(|k| !k.is_empty());
    let dialect = detect_dialect(headers, path, native_key.is_some());

    let (credential, credential_source) = if let Some(key) = native_key {
        (key.to_string(), CredentialSource::NativeHeader)
    } else if let Some(key) = query_key(query).filter(|_| dialect == Dialect::Native) {
        (key, CredentialSource::QueryKey)
    } else if let Some(token) = bearer_token(headers) {
        (token.to_string(), CredentialSource::Bearer)
    } else {
        return Err(GatewayError::Unauthenticated);
    };

    let payload_kind = match dialect {
        Dialect::Native => PayloadKind::NativePassthrough,
        Dialect::Compat => compat_payload_kind(path)
            .ok_or_else(|| GatewayError::NotFound(path.to_string()))?,
    };

    Ok(RequestContext { dialect, credential, credential_source, target_model: None, payload_kind })
}

fn detect_dialect(headers: &HeaderMap, path: &str, has_native_key: bool) -> Dialect {
    let hinted = header_str(headers, X_GEMBRIDGE_DIALECT)
        .is_some_and(|v| v.eq_ignore_ascii_case("native") || v.eq_ignore_ascii_case("gemini"));
    if has_native_key || hinted || is_native_path(path) {
        Dialect::Native
    } else {
        Dialect::Compat
    }
}

/// `/v1beta/...`, `/v1alpha/...`, `/upload/...`, or a stable-API model
/// action such as `/v1/models/gemini-pro:generateContent`.
pub fn is_native_path(path: &str) -> bool {
    NATIVE_PREFIXES.iter().any(|p| path.starts_with(p))
        || path.strip_prefix("/v1/models/").is_some_and(|rest| rest.contains(':'))
}

fn compat_payload_kind(path: &str) -> Option<PayloadKind> {
    let path = path.trim_end_matches('/');
    if path.ends_with("/chat/completions") {
        Some(PayloadKind::Chat)
    } else if path.ends_with("/embeddings") {
        Some(PayloadKind::Embeddings)
    } else if path.ends_with("/models") {
        Some(PayloadKind::ModelList)
    } else {
        None
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = header_str(headers, header::AUTHORIZATION.as_str())?;
    let token = match raw.get(..6) {
        // A bare "Bearer" (value trimmed) carries no credential.
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer") => match raw[6..].chars().next() {
            None => "",
            Some(c) if c.is_ascii_whitespace() => raw[6..].trim(),
            Some(_) => raw,
        },
        _ => raw,
    };
    (!token.is_empty()).then_some(token)
}

fn query_key(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == "key")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}
