//! Activation Audit Log
//!
//! Every admitted motor request is recorded before it is queued. Storage is
//! an external concern; this module defines the record and the narrow write
//! interface, plus two stores:
//!
//! - [`MemoryAuditLog`]: bounded in-memory history
//! - [`FileAuditLog`]: append-only JSON lines file

pub mod file;
pub mod memory;

pub use file::FileAuditLog;
pub use memory::MemoryAuditLog;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::StorageError;

/// One admitted motor activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    /// Request identifier (matches the queued request)
    pub request_id: Uuid,
    /// Authenticated requester
    pub requester: String,
    /// When the request was submitted
    pub requested_at: DateTime<Utc>,
    /// Requested motor-on time in seconds
    pub duration_secs: u64,
}

/// Write side of activation storage.
#[async_trait]
pub trait AuditLog: Send + Sync + fmt::Debug {
    async fn record_activation(&self, record: &ActivationRecord) -> Result<(), StorageError>;
}
