//! Health Probes - Liveness and Readiness Routes
//!
//! Exposes /live and /ready on the host router for Docker health
//! checks. Readiness follows the last database probe result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Whether the last database probe succeeded.
    database_connected: Arc<AtomicBool>,
}

impl HealthState {
    /// Wrap the flag the database monitor writes to.
    pub fn new(database_connected: Arc<AtomicBool>) -> Self {
        Self { database_connected }
    }

    /// Check if the service is ready to serve traffic.
    pub fn is_ready(&self) -> bool {
        self.database_connected.load(Ordering::Relaxed)
    }

    /// Routes for `/live` and `/ready`.
    pub fn router(self) -> Router {
        Router::new()
            .route("/live", get(liveness))
            .route("/ready", get(readiness))
            .with_state(self)
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe: returns 200 only while the database is reachable.
async fn readiness(State(state): State<HealthState>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_follows_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let state = HealthState::new(Arc::clone(&flag));
        assert!(!state.is_ready());
        flag.store(true, Ordering::Relaxed);
        assert!(state.is_ready());
    }
}
