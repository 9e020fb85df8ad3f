//! Health endpoints for the gatekeeper service.
//!
//! - `GET /health` - 200 whenever the process can answer HTTP
//! - `GET /ready` - 200 while the gatekeeper can admit calls
//!
//! Readiness is computed per request from the running service, not from a
//! flag set once at startup. The gatekeeper is ready when:
//! - the gRPC listener has been handed over with [`HealthState::mark_serving`]
//!   and shutdown has not begun,
//! - both hub coordinators answer a status request within
//!   [`READINESS_TIMEOUT`].
//!
//! A stopped coordinator fails the status request outright. A coordinator
//! stalled behind a full subscriber queue does not answer in time; calls
//! would block on it too, so it also reports not ready.
//!
//! The `/metrics` endpoint is merged in by `main` from the Prometheus handle.

use crate::actors::Hub;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::debug;

/// How long each readiness check waits for the hub coordinators.
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

/// What the health endpoints report on.
#[derive(Debug, Default)]
pub struct HealthState {
    /// Set when the gRPC server is up, cleared when shutdown begins.
    serving: AtomicBool,
    hub: OnceLock<Hub>,
}

impl HealthState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the running hub and start reporting on it.
    ///
    /// Only the first hub is kept; later calls just resume serving.
    pub fn mark_serving(&self, hub: Hub) {
        let _ = self.hub.set(hub);
        self.serving.store(true, Ordering::SeqCst);
    }

    /// Report not ready from now on, whatever the hub's state.
    pub fn set_not_ready(&self) {
        self.serving.store(false, Ordering::SeqCst);
    }

    /// Check the listener flag, then ask both coordinators for their status.
    pub async fn is_ready(&self) -> bool {
        if !self.serving.load(Ordering::SeqCst) {
            return false;
        }
        let Some(hub) = self.hub.get() else {
            return false;
        };

        let answered = tokio::time::timeout(READINESS_TIMEOUT, async {
            hub.events().status().await.is_ok() && hub.visits().status().await.is_ok()
        })
        .await;

        match answered {
            Ok(true) => true,
            Ok(false) => {
                debug!(target: "gk.health", "Hub coordinator stopped");
                false
            }
            Err(_) => {
                debug!(
                    target: "gk.health",
                    timeout_secs = READINESS_TIMEOUT.as_secs(),
                    "Hub coordinator did not answer in time"
                );
                false
            }
        }
    }
}

/// Create the health router with liveness and readiness endpoints.
pub fn health_router(health_state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(liveness_handler))
        .route("/ready", get(readiness_handler))
        .with_state(health_state)
}

async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

async fn readiness_handler(State(state): State<Arc<HealthState>>) -> StatusCode {
    if state.is_ready().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tokio_util::sync::CancellationToken;
    use tower::util::ServiceExt;

    async fn get_status(state: &Arc<HealthState>, uri: &str) -> StatusCode {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");
        health_router(Arc::clone(state))
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_liveness_does_not_depend_on_serving() {
        let state = Arc::new(HealthState::new());
        assert_eq!(get_status(&state, "/health").await, StatusCode::OK);
        assert_eq!(get_status(&state, "/nope").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_not_ready_before_serving() {
        let state = Arc::new(HealthState::new());
        assert_eq!(
            get_status(&state, "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_ready_follows_serving_flag() {
        let cancel_token = CancellationToken::new();
        let (hub, _tasks) = Hub::spawn(16, &cancel_token);
        let state = Arc::new(HealthState::new());

        state.mark_serving(hub);
        assert_eq!(get_status(&state, "/ready").await, StatusCode::OK);

        state.set_not_ready();
        assert_eq!(
            get_status(&state, "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        cancel_token.cancel();
    }

    #[tokio::test]
    async fn test_stopped_hub_is_not_ready() {
        let cancel_token = CancellationToken::new();
        let (hub, tasks) = Hub::spawn(16, &cancel_token);
        let state = Arc::new(HealthState::new());
        state.mark_serving(hub);
        assert_eq!(get_status(&state, "/ready").await, StatusCode::OK);

        cancel_token.cancel();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(
            get_status(&state, "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_hub_is_not_ready() {
        let cancel_token = CancellationToken::new();
        let (hub, _tasks) = Hub::spawn(16, &cancel_token);
        let state = Arc::new(HealthState::new());
        state.mark_serving(hub.clone());

        // A full queue that is never read blocks the event coordinator
        let _stuck = hub.subscribe_events(1).await.unwrap();
        hub.events().publish(event()).await.unwrap();
        hub.events().publish(event()).await.unwrap();

        assert!(!state.is_ready().await);

        cancel_token.cancel();
    }

    fn event() -> crate::models::Event {
        crate::models::Event::new("ops", "/gatekeeper.Biz/Add", "127.0.0.1:1")
    }
}
