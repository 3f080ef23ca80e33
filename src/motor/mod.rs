//! Motor Request Gating
//!
//! Admission and execution of timed motor-on requests:
//!
//! - [`AdmissionGate`]: validates, checks shutdown and quota, audits, enqueues
//! - [`QueueProcessor`]: runs queued requests one at a time
//! - [`QuotaTracker`]: rolling 24h motor-on budget
//! - [`ShutdownController`]: operator override that blocks everything
//! - [`StatusReporter`]: read-only status view
//!
//! Delivery is at most once. A request that was admitted can still be
//! dropped when it reaches the front of the queue (shutdown engaged or quota
//! gone in the meantime); that drop is logged and counted but not reported
//! to the submitter.

pub mod gate;
pub mod queue;
pub mod quota;
pub mod request;
pub mod shutdown;
pub mod status;

pub use gate::AdmissionGate;
pub use queue::{
    ProcessOutcome, QueueFull, QueueProcessor, QueueReceiver, RequestQueue, DEFAULT_QUEUE_CAPACITY,
};
pub use quota::{
    ChargeMode, QuotaExceeded, QuotaSnapshot, QuotaTracker, Reservation, DEFAULT_QUOTA_LIMIT,
};
pub use request::MotorRequest;
pub use shutdown::{ShutdownController, ShutdownState};
pub use status::{QuotaStatus, ShutdownStatus, StatusReporter, SystemStatus};
