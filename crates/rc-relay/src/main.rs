//! RC Relay
//!
//! Runs the session relay core and its operational HTTP surface.
//!
//! # Servers
//!
//! - HTTP server for health, status and metrics (default: 0.0.0.0:8090)
//!
//! Transports and REST controllers embed the library and talk to the
//! registry through `SessionRegistryHandle`; this binary hosts the registry
//! and exposes its health.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Spawn the `SessionRegistry` actor
//! 4. Start health HTTP server (liveness, readiness, status, metrics)
//! 5. Mark ready and wait for shutdown signal
//! 6. Mark not ready, drain the registry within the grace period

#![warn(clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use rc_relay::actors::{RelayMetrics, SessionRegistryHandle};
use rc_relay::config::Config;
use rc_relay::observability::{health_router, init_metrics_recorder, HealthState};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rc_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RC Relay");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        relay_id = %config.relay_id,
        health_bind_address = %config.health_bind_address,
        frame_backlog_capacity = config.frame_backlog_capacity,
        observer_buffer = config.observer_buffer,
        shutdown_grace_seconds = config.shutdown_grace_seconds,
        "Configuration loaded successfully"
    );

    // Must happen before any metrics are recorded
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        anyhow::anyhow!(e)
    })?;
    info!("Prometheus metrics recorder initialized");

    let health_state = Arc::new(HealthState::new());

    let metrics = RelayMetrics::new();
    let registry = SessionRegistryHandle::new(config.registry_config(), Arc::clone(&metrics));
    info!("Session registry started");

    let shutdown_token = registry.child_token();

    let health_addr: SocketAddr = config
        .health_bind_address
        .parse()
        .with_context(|| format!("Invalid health bind address: {}", config.health_bind_address))?;

    let metrics_router = Router::new().route(
        "/metrics",
        axum::routing::get(move || {
            let handle = prometheus_handle.clone();
            async move { handle.render() }
        }),
    );

    let app = health_router(Arc::clone(&health_state), registry.clone())
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http());

    // Bind before spawning to fail fast on bind errors
    let listener = tokio::net::TcpListener::bind(health_addr)
        .await
        .with_context(|| format!("Failed to bind health server to {health_addr}"))?;
    info!(addr = %health_addr, "Health server bound successfully");

    let health_shutdown_token = shutdown_token.child_token();
    tokio::spawn(async move {
        info!(addr = %health_addr, "Health server starting");
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            health_shutdown_token.cancelled().await;
            info!("Health server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "Health server failed");
        }
    });

    health_state.set_ready();
    info!("RC Relay running - press Ctrl+C to shutdown");

    shutdown_signal().await;

    info!("Shutdown signal received, initiating graceful shutdown...");
    health_state.set_not_ready();

    let grace = config.shutdown_grace();
    match tokio::time::timeout(grace, registry.shutdown(grace)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Registry shutdown error"),
        Err(_) => {
            warn!(
                grace_seconds = grace.as_secs(),
                "Registry shutdown timed out, cancelling"
            );
            registry.cancel();
        }
    }

    info!(
        sessions_remaining = metrics.session_count(),
        "RC Relay shutdown complete"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
