//! Request Queue and Processor
//!
//! Admitted requests wait in a bounded FIFO channel. A single background
//! task drains it: each request is re-checked against the shutdown override
//! and the quota, then the motor is switched on, held for the requested
//! duration and switched off. Only one request ever holds the motor.
//!
//! Requests dropped at this stage are not reported back to the submitter,
//! who already got a "queued" answer. They are logged and counted.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::quota::QuotaTracker;
use super::request::MotorRequest;
use super::shutdown::ShutdownController;
use crate::actuator::MotorSwitch;
use crate::metrics;

/// Default number of requests that may wait in the queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// The queue had no free slot (or no consumer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

/// Producer handle onto the bounded request queue.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    sender: mpsc::Sender<MotorRequest>,
}

/// Consumer end, owned by the [`QueueProcessor`].
#[derive(Debug)]
pub struct QueueReceiver {
    receiver: mpsc::Receiver<MotorRequest>,
}

/// A reserved place in the queue.
///
/// Dropping the slot without sending returns the place to the queue.
pub struct QueueSlot<'a> {
    permit: mpsc::Permit<'a, MotorRequest>,
    queue: &'a RequestQueue,
}

impl RequestQueue {
    /// Create a queue holding at most `capacity` requests.
    pub fn bounded(capacity: usize) -> (RequestQueue, QueueReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (RequestQueue { sender }, QueueReceiver { receiver })
    }

    /// Reserve a slot without waiting.
    pub fn try_reserve(&self) -> Result<QueueSlot<'_>, QueueFull> {
        match self.sender.try_reserve() {
            Ok(permit) => Ok(QueueSlot {
                permit,
                queue: self,
            }),
            Err(mpsc::error::TrySendError::Full(())) => Err(QueueFull),
            Err(mpsc::error::TrySendError::Closed(())) => {
                error!("Motor request queue has no consumer");
                Err(QueueFull)
            }
        }
    }

    /// Enqueue without waiting.
    pub fn try_enqueue(&self, request: MotorRequest) -> Result<(), QueueFull> {
        self.try_reserve()?.send(request);
        Ok(())
    }

    /// Requests waiting (including reserved slots).
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

impl QueueSlot<'_> {
    /// Place the request in the reserved slot.
    pub fn send(self, request: MotorRequest) {
        self.permit.send(request);
        metrics::QUEUE_DEPTH.set(self.queue.len() as i64);
    }
}

impl QueueReceiver {
    /// Next request in FIFO order; `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<MotorRequest> {
        let request = self.receiver.recv().await;
        metrics::QUEUE_DEPTH.set(self.receiver.len() as i64);
        request
    }
}

/// What happened to a dequeued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Ran for the full duration
    Completed,
    /// Cut short by an operator shutdown
    Interrupted,
    /// Dropped because a shutdown was in effect
    DroppedShutdown,
    /// Dropped because the quota no longer allowed it
    DroppedQuota,
}

/// Single sequential consumer of the request queue.
#[derive(Debug)]
pub struct QueueProcessor {
    receiver: QueueReceiver,
    shutdown: Arc<ShutdownController>,
    quota: Arc<QuotaTracker>,
    switch: MotorSwitch,
}

impl QueueProcessor {
    pub fn new(
        receiver: QueueReceiver,
        shutdown: Arc<ShutdownController>,
        quota: Arc<QuotaTracker>,
        switch: MotorSwitch,
    ) -> Self {
        Self {
            receiver,
            shutdown,
            quota,
            switch,
        }
    }

    /// Run the processor on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drain the queue until every producer handle is dropped.
    pub async fn run(mut self) {
        info!(topic = %self.switch.topic(), "Motor queue processor started");
        let mut shutdown_rx = self.shutdown.subscribe();

        while let Some(request) = self.receiver.recv().await {
            self.process(request, &mut shutdown_rx).await;
        }

        info!("Motor request queue closed, processor stopping");
        let _ = self.switch.off().await;
    }

    async fn process(
        &self,
        request: MotorRequest,
        shutdown_rx: &mut watch::Receiver<u64>,
    ) -> ProcessOutcome {
        let request_id = request.id();
        // Any shutdown after this point ends the run, even if already restarted
        shutdown_rx.borrow_and_update();

        if self.shutdown.is_shutdown() {
            warn!(%request_id, requester = request.requester(), "Dropping queued request: shutdown active");
            metrics::DEQUEUE_DROPS_TOTAL
                .with_label_values(&["shutdown"])
                .inc();
            return ProcessOutcome::DroppedShutdown;
        }

        if let Err(exceeded) = self.quota.finalize(request.reservation()) {
            warn!(
                %request_id,
                requester = request.requester(),
                resets_at = %exceeded.resets_at,
                "Dropping queued request: quota exhausted at execution time"
            );
            metrics::DEQUEUE_DROPS_TOTAL
                .with_label_values(&["quota"])
                .inc();
            return ProcessOutcome::DroppedQuota;
        }

        info!(
            %request_id,
            requester = request.requester(),
            duration_secs = request.duration().as_secs(),
            "Motor on"
        );
        metrics::EXECUTIONS_TOTAL.inc();
        let started = Instant::now();
        let _ = self.switch.on().await;

        // A shutdown that landed while "on" was in flight skips the hold
        let interrupted = if shutdown_rx.has_changed().unwrap_or(true) {
            true
        } else {
            tokio::select! {
                _ = tokio::time::sleep(request.duration()) => false,
                _ = shutdown_rx.changed() => true,
            }
        };

        let _ = self.switch.off().await;
        let held = started.elapsed();
        metrics::MOTOR_RUN_SECONDS.observe(held.as_secs_f64());

        if interrupted {
            warn!(%request_id, held_secs = held.as_secs(), "Motor run interrupted by shutdown");
            ProcessOutcome::Interrupted
        } else {
            info!(%request_id, held_secs = held.as_secs(), "Motor off");
            ProcessOutcome::Completed
        }
    }
}
