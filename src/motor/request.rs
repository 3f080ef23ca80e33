//! Admitted motor request

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

use super::quota::Reservation;
use crate::audit::ActivationRecord;

/// A request that passed admission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotorRequest {
    id: Uuid,
    requester: String,
    requested_at: DateTime<Utc>,
    duration: Duration,
    reservation: Reservation,
}

impl MotorRequest {
    pub(crate) fn new(
        requester: impl Into<String>,
        requested_at: DateTime<Utc>,
        reservation: Reservation,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester: requester.into(),
            requested_at,
            duration: reservation.duration(),
            reservation,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn requester(&self) -> &str {
        &self.requester
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn reservation(&self) -> &Reservation {
        &self.reservation
    }

    /// Audit record for this request.
    pub fn activation_record(&self) -> ActivationRecord {
        ActivationRecord {
            request_id: self.id,
            requester: self.requester.clone(),
            requested_at: self.requested_at,
            duration_secs: self.duration.as_secs(),
        }
    }
}
