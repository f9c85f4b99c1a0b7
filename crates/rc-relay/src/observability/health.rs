//! Health endpoints for the RC relay.
//!
//! - `GET /health` - Liveness probe (is the process running?)
//! - `GET /ready` - Readiness probe (accepting sessions?)
//! - `GET /status` - Registry status as JSON
//!
//! The `/metrics` endpoint is mounted separately in `main` from the
//! Prometheus handle.
//!
//! Readiness requires both the ready flag and a registry that has not been
//! cancelled, so a drained registry drops out of rotation even before
//! `set_not_ready` runs.

use crate::actors::{RegistryStatus, SessionRegistryHandle};

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Liveness and readiness flags.
#[derive(Debug)]
pub struct HealthState {
    live: AtomicBool,
    ready: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (live=true, ready=false).
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: AtomicBool::new(true),
            ready: AtomicBool::new(false),
        }
    }

    /// Mark the service as ready to serve traffic.
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Mark the service as not ready (e.g., during shutdown).
    pub fn set_not_ready(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct HealthContext {
    health: Arc<HealthState>,
    registry: SessionRegistryHandle,
}

/// Create the health router.
pub fn health_router(health_state: Arc<HealthState>, registry: SessionRegistryHandle) -> Router {
    Router::new()
        .route("/health", get(liveness_handler))
        .route("/ready", get(readiness_handler))
        .route("/status", get(status_handler))
        .with_state(HealthContext {
            health: health_state,
            registry,
        })
}

async fn liveness_handler(State(ctx): State<HealthContext>) -> StatusCode {
    if ctx.health.is_live() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn readiness_handler(State(ctx): State<HealthContext>) -> StatusCode {
    if ctx.health.is_ready() && !ctx.registry.is_cancelled() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn status_handler(
    State(ctx): State<HealthContext>,
) -> Result<Json<RegistryStatus>, StatusCode> {
    ctx.registry.get_status().await.map(Json).map_err(|e| {
        warn!(
            target: "rc.health",
            error = %e,
            error_type = e.kind(),
            "Registry status unavailable"
        );
        StatusCode::SERVICE_UNAVAILABLE
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::actors::{ConnectionHandle, RegistryConfig, RelayMetrics};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    fn registry() -> SessionRegistryHandle {
        SessionRegistryHandle::new(RegistryConfig::default(), RelayMetrics::new())
    }

    async fn get_status_code(app: Router, uri: &str) -> StatusCode {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");

        app.oneshot(request)
            .await
            .expect("Failed to execute request")
            .status()
    }

    #[test]
    fn test_health_state_default() {
        let state = HealthState::new();
        assert!(state.is_live(), "Should be live by default");
        assert!(!state.is_ready(), "Should not be ready by default");
    }

    #[test]
    fn test_health_state_set_ready() {
        let state = HealthState::new();

        state.set_ready();
        assert!(state.is_ready());

        state.set_not_ready();
        assert!(!state.is_ready());
    }

    #[tokio::test]
    async fn test_liveness_endpoint() {
        let app = health_router(Arc::new(HealthState::new()), registry());
        assert_eq!(get_status_code(app, "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_endpoint_not_ready() {
        let app = health_router(Arc::new(HealthState::new()), registry());
        assert_eq!(
            get_status_code(app, "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_readiness_endpoint_ready() {
        let state = Arc::new(HealthState::new());
        state.set_ready();
        let app = health_router(state, registry());
        assert_eq!(get_status_code(app, "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_endpoint_after_registry_cancel() {
        let state = Arc::new(HealthState::new());
        state.set_ready();
        let registry = registry();
        registry.cancel();

        let app = health_router(state, registry);
        assert_eq!(
            get_status_code(app, "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_status_endpoint_reports_sessions() {
        let registry = registry();
        let (observer, _rx) = ConnectionHandle::new("obs-1", 4);
        registry
            .create_session("rc-1", "dev-1", observer)
            .await
            .unwrap();

        let app = health_router(Arc::new(HealthState::new()), registry.clone());
        let request = Request::builder()
            .uri("/status")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["session_count"], 1);
        assert_eq!(json["observer_count"], 1);
        assert_eq!(json["is_draining"], false);

        registry.cancel();
    }

    #[tokio::test]
    async fn test_unknown_path_returns_404() {
        let app = health_router(Arc::new(HealthState::new()), registry());
        assert_eq!(
            get_status_code(app, "/unknown").await,
            StatusCode::NOT_FOUND
        );
    }
}
