//! Ticketing API Server
//!
//! HTTP entry point: loads configuration, wires the authenticator to Horizon
//! and serves the API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tokio::signal;
use tower_http::cors::CorsLayer;

use ticketing_server::auth::{AuthService, StellarSignatureVerifier};
use ticketing_server::config::Config;
use ticketing_server::ledger::HorizonClient;
use ticketing_server::middleware::RateLimiter;
use ticketing_server::routes;
use ticketing_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the subscriber reads RUST_LOG
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!(
        environment = config.environment.as_str(),
        horizon_url = %config.horizon_url,
        "Configuration loaded"
    );
    tracing::debug!(?config, "Effective configuration");

    let horizon = HorizonClient::new(config.horizon_url.clone(), config.ledger_timeout)
        .context("Failed to build Horizon client")?;

    let auth_service = Arc::new(AuthService::new(
        config.auth_settings(),
        Arc::new(StellarSignatureVerifier),
        Arc::new(horizon),
    ));

    let rate_limiter = RateLimiter::new(config.auth_rate_limit_rps)
        .with_max_buckets(config.auth_rate_limit_max_clients)
        .with_trusted_proxy_headers(config.trust_proxy_headers);
    rate_limiter.spawn_cleanup(Duration::from_secs(60));

    let app_state = AppState::new(auth_service, rate_limiter);

    let app = routes::app_router(app_state).layer(configure_cors(&config));

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn configure_cors(config: &Config) -> CorsLayer {
    let allowed_origins = config.cors_allowed_origins.as_deref().unwrap_or_default();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    // Explicit origins so the session cookie can travel with credentials
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
