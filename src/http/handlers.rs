// Route handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, warn};

use super::error::ApiError;
use super::identity::{AdminCaller, Caller};
use super::AppState;
use crate::metrics;
use crate::motor::SystemStatus;

/// Body of `POST /api/motor`
#[derive(Debug, Deserialize)]
pub struct MotorRequestBody {
    /// Motor-on time in minutes
    pub duration: Option<i64>,
}

/// Body of `POST /admin/shutdown`
#[derive(Debug, Deserialize)]
pub struct ShutdownBody {
    pub reason: Option<String>,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(inner)| inner)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn minutes_to_duration(minutes: Option<i64>) -> Result<Duration, ApiError> {
    let minutes = minutes.ok_or_else(|| ApiError::BadRequest("duration is required".to_string()))?;
    if minutes <= 0 {
        return Err(ApiError::BadRequest(
            "duration must be a positive number of minutes".to_string(),
        ));
    }
    (minutes as u64)
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| ApiError::BadRequest("duration is too large".to_string()))
}

/// POST /api/motor
pub async fn request_motor(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<MotorRequestBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(body)?;
    let duration = minutes_to_duration(body.duration)?;

    let request = state.gate.admit(&caller.id, duration).await?;

    Ok(Json(json!({
        "message": "Request queued",
        "request_id": request.id(),
        "duration_secs": request.duration().as_secs(),
    })))
}

/// GET /api/motor/status
pub async fn motor_status(State(state): State<AppState>, _caller: Caller) -> Json<SystemStatus> {
    Json(state.reporter.status())
}

/// Reason recorded when the operator gives none
pub const UNSPECIFIED_REASON: &str = "unspecified";

fn shutdown_reason(body: Result<Json<ShutdownBody>, JsonRejection>) -> String {
    match body {
        Ok(Json(ShutdownBody { reason: Some(reason) })) if !reason.trim().is_empty() => {
            reason.trim().to_string()
        }
        Ok(_) => UNSPECIFIED_REASON.to_string(),
        Err(rejection) => {
            warn!("Unreadable shutdown body, engaging anyway: {}", rejection.body_text());
            UNSPECIFIED_REASON.to_string()
        }
    }
}

/// POST /admin/shutdown
///
/// Never refused for an admin: a missing or unreadable body only loses the
/// reason.
pub async fn force_shutdown(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
    body: Result<Json<ShutdownBody>, JsonRejection>,
) -> Json<Value> {
    let reason = shutdown_reason(body);

    info!(operator = %caller.id, %reason, "Shutdown requested");
    state.shutdown.force_shutdown(reason, caller.id).await;

    Json(json!({
        "message": "System shut down",
        "shutdown_status": state.reporter.shutdown_status(),
    }))
}

/// POST /admin/restart
pub async fn restart(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
) -> Json<Value> {
    info!(operator = %caller.id, "Restart requested");
    state.shutdown.restart();

    Json(json!({
        "message": "System restarted",
        "shutdown_status": state.reporter.shutdown_status(),
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /metrics
pub async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error gathering metrics: {}", e),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_to_duration() {
        assert_eq!(
            minutes_to_duration(Some(5)).unwrap(),
            Duration::from_secs(300)
        );
        assert!(matches!(
            minutes_to_duration(None),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            minutes_to_duration(Some(0)),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            minutes_to_duration(Some(-10)),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            minutes_to_duration(Some(i64::MAX)),
            Err(ApiError::BadRequest(_))
        ));
    }
}
