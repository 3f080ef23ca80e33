//! Status Reporting
//!
//! Read-only view of the shutdown override, the quota window and the queue.
//! Building a report never changes any state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::queue::RequestQueue;
use super::quota::{ChargeMode, QuotaSnapshot, QuotaTracker};
use super::shutdown::{ShutdownController, ShutdownState};

/// Shutdown override as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownStatus {
    pub is_shutdown: bool,
    pub reason: Option<String>,
    pub shutdown_by: Option<String>,
    pub shutdown_at: Option<DateTime<Utc>>,
}

impl From<ShutdownState> for ShutdownStatus {
    fn from(state: ShutdownState) -> Self {
        match state {
            ShutdownState::Normal => Self {
                is_shutdown: false,
                reason: None,
                shutdown_by: None,
                shutdown_at: None,
            },
            ShutdownState::Shutdown {
                reason,
                initiated_by,
                initiated_at,
            } => Self {
                is_shutdown: true,
                reason: Some(reason),
                shutdown_by: Some(initiated_by),
                shutdown_at: Some(initiated_at),
            },
        }
    }
}

/// Quota window as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub used_secs: u64,
    pub limit_secs: u64,
    pub remaining_secs: u64,
    pub resets_at: DateTime<Utc>,
}

impl From<QuotaSnapshot> for QuotaStatus {
    fn from(snapshot: QuotaSnapshot) -> Self {
        Self {
            used_secs: snapshot.used.as_secs(),
            limit_secs: snapshot.limit.as_secs(),
            remaining_secs: snapshot.remaining.as_secs(),
            resets_at: snapshot.resets_at,
        }
    }
}

/// Full status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// When the report was built
    pub timestamp: DateTime<Utc>,
    pub shutdown_status: ShutdownStatus,
    pub quota: QuotaStatus,
    /// Requests waiting to run, plus slots held by admissions whose audit
    /// write is still in flight
    pub queue_depth: usize,
    pub queue_capacity: usize,
    pub charge_mode: ChargeMode,
}

/// Builds [`SystemStatus`] reports from the live components.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    shutdown: Arc<ShutdownController>,
    quota: Arc<QuotaTracker>,
    queue: RequestQueue,
}

impl StatusReporter {
    pub fn new(
        shutdown: Arc<ShutdownController>,
        quota: Arc<QuotaTracker>,
        queue: RequestQueue,
    ) -> Self {
        Self {
            shutdown,
            quota,
            queue,
        }
    }

    pub fn shutdown_status(&self) -> ShutdownStatus {
        self.shutdown.snapshot().into()
    }

    pub fn quota_status(&self) -> QuotaStatus {
        self.quota.snapshot().into()
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            timestamp: Utc::now(),
            shutdown_status: self.shutdown_status(),
            quota: self.quota_status(),
            queue_depth: self.queue.len(),
            queue_capacity: self.queue.capacity(),
            charge_mode: self.quota.charge_mode(),
        }
    }
}
