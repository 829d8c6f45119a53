//! gembridge Server - Headless Daemon
//!
//! Serves the translation gateway:
//! - OpenAI-compatible chat, embeddings and models under any path prefix
//! - Native Gemini passthrough on /v1beta/*, /v1alpha/*, /upload/*
//! - Realtime websocket relay on any `Upgrade: websocket` request
//!
//! Access via: http://localhost:8045

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use gembridge_core::modules::config::load_config;
use gembridge_core::proxy::GatewayServer;
use gembridge_types::GatewayConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = apply_overrides(load_config(cli.config.as_deref())?, &cli)?;

    tracing::info!("[Server] gembridge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "[Server] Upstream {} (api {}), default model {}",
        config.upstream_base_url,
        config.api_version,
        config.default_model
    );

    GatewayServer::new(config)
        .run(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

/// Resolves on SIGINT or SIGTERM. A handler that fails to install only
/// disables its own signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("[Server] Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                tracing::error!("[Server] SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("[Server] Ctrl+C, draining connections"),
        () = terminate => tracing::info!("[Server] SIGTERM, draining connections"),
    }
}

/// CLI/env values win over the config file; the result is re-validated.
fn apply_overrides(mut config: GatewayConfig, cli: &Cli) -> Result<GatewayConfig> {
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    Ok(config.validated()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_file_values() {
        let cli = Cli::parse_from(["gembridge", "--host", "0.0.0.0", "--port", "9100"]);
        let config = apply_overrides(GatewayConfig::default(), &cli).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9100");
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = Cli::parse_from(["gembridge", "--port", "0"]);
        assert!(apply_overrides(GatewayConfig::default(), &cli).is_err());
    }
}
