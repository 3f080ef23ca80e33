//! HTTP API
//!
//! axum front end for the motor service:
//!
//! - `POST /api/motor` submit a motor request (`{"duration": <minutes>}`)
//! - `GET /api/motor/status` status report
//! - `POST /admin/shutdown` engage the operator shutdown (admin)
//! - `POST /admin/restart` clear it (admin)
//! - `GET /health`, `GET /metrics`

pub mod error;
pub mod handlers;
pub mod identity;
pub mod server;

pub use error::ApiError;
pub use identity::{AdminCaller, Caller};
pub use server::{run, serve};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::motor::{AdmissionGate, ShutdownController, StatusReporter};
use crate::service::MotorService;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub gate: AdmissionGate,
    pub shutdown: Arc<ShutdownController>,
    pub reporter: StatusReporter,
}

impl AppState {
    pub fn new(service: &MotorService) -> Self {
        Self {
            gate: service.gate().clone(),
            shutdown: service.shutdown().clone(),
            reporter: service.reporter().clone(),
        }
    }
}

/// Build the API router.
pub fn router(state: AppState, metrics_enabled: bool) -> Router {
    let mut app = Router::new()
        .route("/api/motor", post(handlers::request_motor))
        .route("/api/motor/status", get(handlers::motor_status))
        .route("/admin/shutdown", post(handlers::force_shutdown))
        .route("/admin/restart", post(handlers::restart))
        .route("/health", get(handlers::health));

    if metrics_enabled {
        app = app.route("/metrics", get(handlers::metrics_handler));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
