//! Actuator Interface
//!
//! The motor is driven by publishing `on` / `off` payloads to a control
//! topic on a publish/subscribe transport. The transport itself lives
//! outside this crate; implementations of [`Actuator`] adapt to it.
//!
//! - [`LogActuator`]: dry run, only logs commands
//! - [`HttpActuator`]: forwards publishes to a messaging bridge over HTTP
//! - [`RecordingActuator`]: keeps commands in memory (tests, diagnostics)

pub mod http;
pub mod log;
pub mod recording;

pub use http::HttpActuator;
pub use log::LogActuator;
pub use recording::RecordingActuator;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::PublishError;
use crate::metrics;

/// Payload that switches the motor on
pub const PAYLOAD_ON: &str = "on";

/// Payload that switches the motor off
pub const PAYLOAD_OFF: &str = "off";

/// Default control topic
pub const DEFAULT_CONTROL_TOPIC: &str = "motor/control";

/// Publish side of the device transport.
#[async_trait]
pub trait Actuator: Send + Sync + fmt::Debug {
    /// Publish an opaque payload to a topic.
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError>;
}

/// Actuator bound to the motor's control topic.
///
/// Publishing is best-effort: failures are logged and counted here and then
/// handed back so callers can decide whether they care.
#[derive(Debug, Clone)]
pub struct MotorSwitch {
    actuator: Arc<dyn Actuator>,
    topic: String,
}

impl MotorSwitch {
    pub fn new(actuator: Arc<dyn Actuator>, topic: impl Into<String>) -> Self {
        Self {
            actuator,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Command the motor on.
    pub async fn on(&self) -> Result<(), PublishError> {
        self.send(PAYLOAD_ON).await
    }

    /// Command the motor off.
    pub async fn off(&self) -> Result<(), PublishError> {
        self.send(PAYLOAD_OFF).await
    }

    async fn send(&self, payload: &'static str) -> Result<(), PublishError> {
        match self
            .actuator
            .publish(&self.topic, Bytes::from_static(payload.as_bytes()))
            .await
        {
            Ok(()) => {
                debug!(topic = %self.topic, payload, "Motor command published");
                Ok(())
            }
            Err(e) => {
                warn!(topic = %self.topic, payload, error = %e, "Motor command publish failed");
                metrics::ACTUATOR_FAILURES_TOTAL
                    .with_label_values(&[payload])
                    .inc();
                Err(e)
            }
        }
    }
}
