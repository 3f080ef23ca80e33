//! Operator Shutdown Override
//!
//! A two-state machine (`Normal` / `Shutdown`) that blocks admission and
//! execution while active. Entering `Shutdown` also commands the motor off
//! right away, without waiting for the queue processor.
//!
//! Every shutdown bumps a counter on a watch channel. The processor compares
//! it against the value seen before switching the motor on, so a shutdown
//! that was already followed by a restart still ends the hold.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::actuator::MotorSwitch;
use crate::clock::Clock;
use crate::metrics;

/// Current override state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShutdownState {
    #[default]
    Normal,
    Shutdown {
        reason: String,
        initiated_by: String,
        initiated_at: DateTime<Utc>,
    },
}

impl ShutdownState {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, ShutdownState::Shutdown { .. })
    }
}

/// Owner of the shutdown state.
#[derive(Debug)]
pub struct ShutdownController {
    state: Mutex<ShutdownState>,
    signal: watch::Sender<u64>,
    switch: MotorSwitch,
    clock: Arc<dyn Clock>,
}

impl ShutdownController {
    pub fn new(switch: MotorSwitch, clock: Arc<dyn Clock>) -> Self {
        let (signal, _) = watch::channel(0);
        Self {
            state: Mutex::new(ShutdownState::Normal),
            signal,
            switch,
            clock,
        }
    }

    /// Enter `Shutdown`, replacing any earlier shutdown metadata.
    ///
    /// Always succeeds. The motor is commanded off after the state lock is
    /// released; a failed publish is logged and does not undo the shutdown.
    pub async fn force_shutdown(
        &self,
        reason: impl Into<String>,
        initiated_by: impl Into<String>,
    ) -> ShutdownState {
        let new_state = ShutdownState::Shutdown {
            reason: reason.into(),
            initiated_by: initiated_by.into(),
            initiated_at: self.clock.now(),
        };

        {
            let mut state = self.state.lock();
            *state = new_state.clone();
            self.signal.send_modify(|count| *count += 1);
        }

        if let ShutdownState::Shutdown {
            reason,
            initiated_by,
            ..
        } = &new_state
        {
            warn!(%reason, %initiated_by, "Operator shutdown engaged");
        }
        metrics::SHUTDOWN_ACTIVE.set(1);
        metrics::SHUTDOWN_TRANSITIONS_TOTAL
            .with_label_values(&["shutdown"])
            .inc();

        // Failure is already logged and counted by the switch
        let _ = self.switch.off().await;

        new_state
    }

    /// Return to `Normal`, clearing all shutdown metadata.
    pub fn restart(&self) {
        {
            let mut state = self.state.lock();
            *state = ShutdownState::Normal;
        }

        info!("Operator restart: normal operation resumed");
        metrics::SHUTDOWN_ACTIVE.set(0);
        metrics::SHUTDOWN_TRANSITIONS_TOTAL
            .with_label_values(&["normal"])
            .inc();
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ShutdownState {
        self.state.lock().clone()
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().is_shutdown()
    }

    /// Receiver of the number of shutdowns engaged so far.
    ///
    /// Restarts leave the count alone.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.signal.subscribe()
    }
}
