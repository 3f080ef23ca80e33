//! Error Types
//!
//! Typed errors for the admission path and its external collaborators.

use chrono::{DateTime, Utc};

/// Reasons an admission attempt is rejected.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    /// Operator shutdown is in effect
    #[error("System is shut down by {initiated_by} at {initiated_at}: {reason}")]
    ShutdownActive {
        reason: String,
        initiated_by: String,
        initiated_at: DateTime<Utc>,
    },

    /// Daily budget would be exceeded
    #[error("Daily motor-on quota reached. Try again after {resets_at}.")]
    QuotaExceeded { resets_at: DateTime<Utc> },

    /// No free slot in the request queue
    #[error("Motor request queue is full, retry later")]
    QueueFull,

    /// Audit record could not be written; the request was not queued
    #[error("Failed to log request: {0}")]
    AuditWriteFailed(#[from] StorageError),

    /// Malformed request
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AdmissionError {
    /// Stable short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AdmissionError::ShutdownActive { .. } => "shutdown_active",
            AdmissionError::QuotaExceeded { .. } => "quota_exceeded",
            AdmissionError::QueueFull => "queue_full",
            AdmissionError::AuditWriteFailed(_) => "audit_write_failed",
            AdmissionError::InvalidInput(_) => "invalid_input",
        }
    }
}

/// Failure to deliver a command to the actuator.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Transport could not reach the device bridge
    #[error("Transport error: {0}")]
    Transport(String),

    /// Bridge answered with a non-success status
    #[error("Bridge rejected publish to {topic}: HTTP {status}")]
    Rejected { topic: String, status: u16 },

    /// Publish did not complete in time
    #[error("Publish timed out after {0}ms")]
    Timeout(u64),
}

/// Failure to persist an audit record.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
