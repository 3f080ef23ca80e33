// Append-only JSON lines audit log
//
// One activation per line. Writes are serialized through a mutex so lines
// from concurrent admissions never interleave.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use super::{ActivationRecord, AuditLog};
use crate::error::StorageError;

#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAuditLog {
    /// Open (or create) the log file for appending
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        info!("Audit log opened at {:?}", path);
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditLog for FileAuditLog {
    async fn record_activation(&self, record: &ActivationRecord) -> Result<(), StorageError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn record(requester: &str) -> ActivationRecord {
        ActivationRecord {
            request_id: Uuid::new_v4(),
            requester: requester.to_string(),
            requested_at: Utc::now(),
            duration_secs: 300,
        }
    }

    #[tokio::test]
    async fn test_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit").join("activations.jsonl");

        let log = FileAuditLog::open(&path).await.unwrap();
        let first = record("user-1");
        let second = record("user-2");
        log.record_activation(&first).await.unwrap();
        log.record_activation(&second).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<ActivationRecord> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines, vec![first, second]);
    }

    #[tokio::test]
    async fn test_reopen_keeps_existing_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("activations.jsonl");

        {
            let log = FileAuditLog::open(&path).await.unwrap();
            log.record_activation(&record("user-1")).await.unwrap();
        }
        let log = FileAuditLog::open(&path).await.unwrap();
        log.record_activation(&record("user-2")).await.unwrap();

        let content = tokio::fs::read_to_string(log.path()).await.unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
