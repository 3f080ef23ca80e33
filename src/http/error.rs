// HTTP error responses
//
// Every failure leaves the API as a JSON body with an "error" message.
// Admission rejections carry the extra context a client needs to act on
// them (reset time, shutdown metadata, retry hint).

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::AdmissionError;

/// Seconds a client is told to wait after `QueueFull`
pub const QUEUE_FULL_RETRY_AFTER_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No authenticated identity on the request
    #[error("missing or invalid identity")]
    Unauthorized,

    /// Identity lacks the required role
    #[error("admin role required")]
    Forbidden,

    /// Malformed request body
    #[error("{0}")]
    BadRequest(String),

    /// Rejected by the admission gate
    #[error(transparent)]
    Admission(#[from] AdmissionError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Admission(e) => match e {
                AdmissionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AdmissionError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
                AdmissionError::ShutdownActive { .. } | AdmissionError::QueueFull => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                AdmissionError::AuditWriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Self::Admission(AdmissionError::QuotaExceeded { resets_at }) => json!({
                "error": self.to_string(),
                "resets_at": resets_at,
            }),
            Self::Admission(AdmissionError::ShutdownActive {
                reason,
                initiated_by,
                initiated_at,
            }) => json!({
                "error": "system is shut down",
                "reason": reason,
                "shutdown_by": initiated_by,
                "shutdown_at": initiated_at,
            }),
            Self::Admission(AdmissionError::QueueFull) => json!({
                "error": "motor request queue is full",
                "retry_after_secs": QUEUE_FULL_RETRY_AFTER_SECS,
            }),
            // Storage details stay in the logs
            Self::Admission(AdmissionError::AuditWriteFailed(_)) => json!({
                "error": "failed to log request",
            }),
            Self::Admission(AdmissionError::InvalidInput(msg)) | Self::BadRequest(msg) => json!({
                "error": msg,
            }),
            Self::Unauthorized | Self::Forbidden => json!({
                "error": self.to_string(),
            }),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::Admission(AdmissionError::QueueFull)) {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(QUEUE_FULL_RETRY_AFTER_SECS),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use chrono::Utc;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(AdmissionError::InvalidInput("x".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AdmissionError::QuotaExceeded {
                resets_at: Utc::now()
            })
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::from(AdmissionError::ShutdownActive {
                reason: "maintenance".to_string(),
                initiated_by: "opA".to_string(),
                initiated_at: Utc::now(),
            })
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(AdmissionError::QueueFull).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(AdmissionError::AuditWriteFailed(StorageError::Unavailable(
                "down".to_string()
            )))
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_queue_full_sets_retry_after() {
        let response = ApiError::from(AdmissionError::QueueFull).into_response();
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            &QUEUE_FULL_RETRY_AFTER_SECS.to_string()
        );
    }

    #[test]
    fn test_other_errors_have_no_retry_after() {
        let response = ApiError::Forbidden.into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
