//! Admission Gate
//!
//! Synchronous decision path for a new motor request. Checks run in a fixed
//! order and the first failure wins:
//!
//! 1. input validation
//! 2. shutdown override
//! 3. daily quota (charged on success)
//! 4. queue slot reservation
//! 5. audit write
//!
//! The quota charge is handed back if a later step fails, so a rejected
//! request never consumes budget. The queue slot is reserved before the
//! audit write so an audited request is always enqueued.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::queue::RequestQueue;
use super::quota::QuotaTracker;
use super::request::MotorRequest;
use super::shutdown::{ShutdownController, ShutdownState};
use crate::audit::AuditLog;
use crate::clock::Clock;
use crate::error::AdmissionError;
use crate::metrics;

/// Front door for motor requests.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    shutdown: Arc<ShutdownController>,
    quota: Arc<QuotaTracker>,
    queue: RequestQueue,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
}

impl AdmissionGate {
    pub fn new(
        shutdown: Arc<ShutdownController>,
        quota: Arc<QuotaTracker>,
        queue: RequestQueue,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            shutdown,
            quota,
            queue,
            audit,
            clock,
        }
    }

    /// Decide on a request and enqueue it if admitted.
    ///
    /// Returns the queued request. Admission does not mean the motor will
    /// run: the request is checked again when it reaches the front of the
    /// queue.
    pub async fn admit(
        &self,
        requester: &str,
        duration: Duration,
    ) -> Result<MotorRequest, AdmissionError> {
        match self.try_admit(requester, duration).await {
            Ok(request) => {
                metrics::ADMISSIONS_TOTAL.inc();
                info!(
                    request_id = %request.id(),
                    requester,
                    duration_secs = duration.as_secs(),
                    queue_depth = self.queue.len(),
                    "Motor request queued"
                );
                Ok(request)
            }
            Err(e) => {
                metrics::REJECTIONS_TOTAL
                    .with_label_values(&[e.kind()])
                    .inc();
                match &e {
                    AdmissionError::AuditWriteFailed(_) => {
                        warn!(requester, error = %e, "Motor request rejected")
                    }
                    _ => debug!(requester, reason = e.kind(), "Motor request rejected"),
                }
                Err(e)
            }
        }
    }

    async fn try_admit(
        &self,
        requester: &str,
        duration: Duration,
    ) -> Result<MotorRequest, AdmissionError> {
        if requester.trim().is_empty() {
            return Err(AdmissionError::InvalidInput(
                "requester identity is required".to_string(),
            ));
        }
        if duration.is_zero() {
            return Err(AdmissionError::InvalidInput(
                "duration must be greater than zero".to_string(),
            ));
        }

        if let ShutdownState::Shutdown {
            reason,
            initiated_by,
            initiated_at,
        } = self.shutdown.snapshot()
        {
            return Err(AdmissionError::ShutdownActive {
                reason,
                initiated_by,
                initiated_at,
            });
        }

        let reservation = self
            .quota
            .check_and_reserve(duration)
            .map_err(|e| AdmissionError::QuotaExceeded {
                resets_at: e.resets_at,
            })?;

        let slot = match self.queue.try_reserve() {
            Ok(slot) => slot,
            Err(_) => {
                self.quota.release(&reservation);
                return Err(AdmissionError::QueueFull);
            }
        };

        let request = MotorRequest::new(requester, self.clock.now(), reservation);
        if let Err(e) = self
            .audit
            .record_activation(&request.activation_record())
            .await
        {
            // Dropping the slot hands it back to the queue
            drop(slot);
            self.quota.release(&reservation);
            return Err(AdmissionError::AuditWriteFailed(e));
        }

        slot.send(request.clone());
        Ok(request)
    }
}
