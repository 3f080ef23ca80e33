//! Rolling Daily Quota
//!
//! Tracks accumulated motor-on time against a fixed limit over a 24-hour
//! window. The window is lazy: it only rolls over when an operation observes
//! that the reset time has passed, and the next window starts at that moment.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::metrics;

/// Default daily motor-on budget (1 hour)
pub const DEFAULT_QUOTA_LIMIT: Duration = Duration::from_secs(60 * 60);

/// Length of a quota window in hours
pub const QUOTA_PERIOD_HOURS: i64 = 24;

/// How dequeue-time accounting treats the charge taken at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeMode {
    /// Admission charges; dequeue only re-charges if the window rolled over
    #[default]
    Single,
    /// Admission charges and dequeue charges again
    Double,
}

impl fmt::Display for ChargeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargeMode::Single => f.write_str("single"),
            ChargeMode::Double => f.write_str("double"),
        }
    }
}

impl FromStr for ChargeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(ChargeMode::Single),
            "double" => Ok(ChargeMode::Double),
            other => Err(format!(
                "Invalid charge mode: {}. Must be one of: single, double",
                other
            )),
        }
    }
}

/// Budget taken at admission, tagged with the window it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    duration: Duration,
    generation: u64,
}

impl Reservation {
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Window generation the charge was applied to
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The requested duration does not fit in the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaExceeded {
    /// When the current window ends and usage returns to zero
    pub resets_at: DateTime<Utc>,
}

/// Point-in-time view of the quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub used: Duration,
    pub limit: Duration,
    pub remaining: Duration,
    pub resets_at: DateTime<Utc>,
}

#[derive(Debug)]
struct QuotaState {
    used: Duration,
    resets_at: DateTime<Utc>,
    generation: u64,
}

impl QuotaState {
    fn roll_window(&mut self, now: DateTime<Utc>, period: chrono::Duration) {
        if now > self.resets_at {
            self.used = Duration::ZERO;
            self.resets_at = now + period;
            self.generation += 1;
        }
    }

    fn try_charge(&mut self, duration: Duration, limit: Duration) -> bool {
        match self.used.checked_add(duration) {
            Some(total) if total <= limit => {
                self.used = total;
                true
            }
            _ => false,
        }
    }
}

/// Shared daily usage accumulator.
#[derive(Debug)]
pub struct QuotaTracker {
    limit: Duration,
    period: chrono::Duration,
    mode: ChargeMode,
    clock: Arc<dyn Clock>,
    state: Mutex<QuotaState>,
}

impl QuotaTracker {
    /// Create a tracker whose first window starts now.
    pub fn new(limit: Duration, mode: ChargeMode, clock: Arc<dyn Clock>) -> Self {
        let period = chrono::Duration::hours(QUOTA_PERIOD_HOURS);
        let state = QuotaState {
            used: Duration::ZERO,
            resets_at: clock.now() + period,
            generation: 0,
        };
        Self {
            limit,
            period,
            mode,
            clock,
            state: Mutex::new(state),
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn charge_mode(&self) -> ChargeMode {
        self.mode
    }

    /// Admission-time check: charge `duration` if it fits in the window.
    pub fn check_and_reserve(&self, duration: Duration) -> Result<Reservation, QuotaExceeded> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.roll_window(now, self.period);

        if !state.try_charge(duration, self.limit) {
            return Err(QuotaExceeded {
                resets_at: state.resets_at,
            });
        }

        metrics::QUOTA_USED_SECONDS.set(state.used.as_secs_f64());
        Ok(Reservation {
            duration,
            generation: state.generation,
        })
    }

    /// Execution-time accounting for a dequeued request.
    ///
    /// Applies the same reset rule as admission. In [`ChargeMode::Double`]
    /// the duration is charged again; in [`ChargeMode::Single`] it is only
    /// charged again when the window rolled over after admission.
    pub fn finalize(&self, reservation: &Reservation) -> Result<(), QuotaExceeded> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.roll_window(now, self.period);

        let already_charged =
            self.mode == ChargeMode::Single && state.generation == reservation.generation;
        if already_charged {
            return Ok(());
        }

        if !state.try_charge(reservation.duration, self.limit) {
            return Err(QuotaExceeded {
                resets_at: state.resets_at,
            });
        }

        metrics::QUOTA_USED_SECONDS.set(state.used.as_secs_f64());
        Ok(())
    }

    /// Return an admission charge that never led to a queued request.
    ///
    /// No-op if the window has rolled over since the reservation was taken.
    pub fn release(&self, reservation: &Reservation) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.roll_window(now, self.period);

        if state.generation == reservation.generation {
            state.used = state.used.saturating_sub(reservation.duration);
            metrics::QUOTA_USED_SECONDS.set(state.used.as_secs_f64());
        }
    }

    /// Read-only view. An expired window reports zero usage without being
    /// rolled over.
    pub fn snapshot(&self) -> QuotaSnapshot {
        let now = self.clock.now();
        let state = self.state.lock();
        let used = if now > state.resets_at {
            Duration::ZERO
        } else {
            state.used
        };
        QuotaSnapshot {
            used,
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
            resets_at: state.resets_at,
        }
    }
}
