//! Realtime websocket relay.
//!
//! Upgrade requests are intercepted before admission and handed to
//! [`relay::run_relay`], which connects to `<realtime_base_url><path>?<query>`
//! and shuttles frames both ways.

pub mod relay;
pub mod session;

pub use relay::run_relay;
pub use session::{RelaySession, RelayState};

use axum::{
    extract::{FromRequestParts, Request, State, WebSocketUpgrade},
    http::{header, HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::proxy::server::AppState;

/// `Upgrade: websocket`, compared case-insensitively.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("websocket"))
}

pub fn upstream_url(realtime_base_url: &str, uri: &Uri) -> String {
    let target = uri.path_and_query().map_or_else(|| uri.path(), |pq| pq.as_str());
    format!("{}{}", realtime_base_url.trim_end_matches('/'), target)
}

/// Routes websocket upgrades to the relay; everything else continues down
/// the stack.
pub async fn realtime_upgrade_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_websocket_upgrade(request.headers()) {
        return next.run(request).await;
    }

    let url = upstream_url(&state.config.realtime_base_url, request.uri());
    tracing::info!("[Relay] Upgrade requested on {}", request.uri().path());
    let (mut parts, _body) = request.into_parts();
    match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
        Ok(ws) => ws.on_upgrade(move |socket| run_relay(socket, url)).into_response(),
        Err(rejection) => rejection.into_response(),
    }
}
