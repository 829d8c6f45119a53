use axum::{middleware, routing::get, Router};
use gembridge_types::GatewayConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::proxy::cache::ResponseCache;
use crate::proxy::common::client_builder::build_http_client;
use crate::proxy::handlers;
use crate::proxy::middleware::{admission_middleware, cors_middleware, RateLimiter, ScanDetector};
use crate::proxy::realtime::realtime_upgrade_middleware;
use crate::proxy::upstream::UpstreamClient;

const CONNECT_TIMEOUT_SECS: u64 = 20;

/// Axum application state. Every service object is built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub upstream: UpstreamClient,
    pub cache: Arc<ResponseCache>,
    pub rate_limiter: Arc<RateLimiter>,
    pub scan_detector: Arc<ScanDetector>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self, String> {
        let http_client = build_http_client(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))?;
        Ok(Self::with_client(config, http_client))
    }

    pub fn with_client(config: GatewayConfig, http_client: reqwest::Client) -> Self {
        Self {
            upstream: UpstreamClient::new(http_client, &config),
            cache: Arc::new(ResponseCache::new(config.cache.capacity)),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limits.clone())),
            scan_detector: Arc::new(ScanDetector::new(config.scan.clone())),
            config: Arc::new(config),
        }
    }
}

/// Build the gateway router.
///
/// Layer order, outermost first: realtime upgrade, tracing, CORS, admission.
/// CORS wraps admission so rejected requests still carry CORS headers.
pub fn build_router(state: AppState) -> Router<()> {
    Router::new()
        .route("/healthz", get(handlers::handle_health))
        .fallback(handlers::dispatch)
        .layer(middleware::from_fn_with_state(state.clone(), admission_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(state.clone(), realtime_upgrade_middleware))
        .with_state(state)
}

/// Axum server instance
pub struct GatewayServer {
    config: GatewayConfig,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub async fn run<F>(self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_address();
        let state = AppState::new(self.config)?;
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("[Server] Listening on {}", addr);
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("[Server] Stopped");
        Ok(())
    }
}
