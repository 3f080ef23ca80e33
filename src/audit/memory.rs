// In-memory activation history
//
// Keeps the most recent activations up to a fixed capacity; older records
// are evicted first. Can be switched into a failing mode to simulate an
// unavailable store.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{ActivationRecord, AuditLog};
use crate::error::StorageError;

/// Default number of records retained
pub const DEFAULT_RETENTION: usize = 10_000;

/// Bounded in-memory audit log
#[derive(Debug)]
pub struct MemoryAuditLog {
    records: RwLock<VecDeque<ActivationRecord>>,
    retention: usize,
    unavailable: AtomicBool,
}

impl MemoryAuditLog {
    /// Create an empty log with the default retention
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Create an empty log keeping at most `retention` records
    pub fn with_retention(retention: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            retention: retention.max(1),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All retained records, oldest first
    pub async fn records(&self) -> Vec<ActivationRecord> {
        self.records.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record_activation(&self, record: &ActivationRecord) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "audit store marked unavailable".to_string(),
            ));
        }

        let mut records = self.records.write().await;
        if records.len() == self.retention {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(requester: &str, duration_secs: u64) -> ActivationRecord {
        ActivationRecord {
            request_id: Uuid::new_v4(),
            requester: requester.to_string(),
            requested_at: Utc::now(),
            duration_secs,
        }
    }

    #[tokio::test]
    async fn test_record_and_list() {
        let log = MemoryAuditLog::new();
        log.record_activation(&record("user-1", 60)).await.unwrap();
        log.record_activation(&record("user-2", 120)).await.unwrap();

        let records = log.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].requester, "user-1");
        assert_eq!(records[1].duration_secs, 120);
    }

    #[tokio::test]
    async fn test_retention_evicts_oldest() {
        let log = MemoryAuditLog::with_retention(2);
        for i in 0..3 {
            log.record_activation(&record(&format!("user-{}", i), 60))
                .await
                .unwrap();
        }

        let records = log.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].requester, "user-1");
        assert_eq!(records[1].requester, "user-2");
    }

    #[tokio::test]
    async fn test_unavailable_store_rejects_writes() {
        let log = MemoryAuditLog::new();
        log.set_unavailable(true);

        let result = log.record_activation(&record("a", 60)).await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
        assert!(log.is_empty().await);

        log.set_unavailable(false);
        assert!(log.record_activation(&record("a", 60)).await.is_ok());
    }
}
