// In-memory actuator that remembers every publish

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tokio::time::Instant;

use super::Actuator;
use crate::error::PublishError;

/// A publish seen by [`RecordingActuator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedCommand {
    pub topic: String,
    pub payload: String,
    pub at: Instant,
}

#[derive(Debug, Default)]
pub struct RecordingActuator {
    commands: Mutex<Vec<PublishedCommand>>,
    failures_pending: AtomicUsize,
    published: Notify,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` publishes fail with a transport error.
    pub fn fail_next(&self, n: usize) {
        self.failures_pending.store(n, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<PublishedCommand> {
        self.commands.lock().clone()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.commands
            .lock()
            .iter()
            .map(|c| c.payload.clone())
            .collect()
    }

    /// Wait until at least `count` commands have been recorded.
    pub async fn wait_for_commands(&self, count: usize) {
        loop {
            let notified = self.published.notified();
            if self.commands.lock().len() >= count {
                return;
            }
            notified.await;
        }
    }

    fn take_failure(&self) -> bool {
        self.failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Actuator for RecordingActuator {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        if self.take_failure() {
            return Err(PublishError::Transport("injected failure".to_string()));
        }

        self.commands.lock().push(PublishedCommand {
            topic: topic.to_string(),
            payload: String::from_utf8_lossy(&payload).into_owned(),
            at: Instant::now(),
        });
        self.published.notify_waiters();
        Ok(())
    }
}
