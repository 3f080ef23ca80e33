//! Service Wiring
//!
//! Builds the motor components from configuration and connects them: one
//! shared quota tracker and shutdown controller, one bounded queue, and a
//! single queue processor.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::actuator::{Actuator, HttpActuator, LogActuator, MotorSwitch};
use crate::audit::{AuditLog, FileAuditLog, MemoryAuditLog};
use crate::clock::{Clock, SystemClock};
use crate::config::{ActuatorConfig, AuditConfig, Config, MotorConfig};
use crate::motor::{
    AdmissionGate, QueueProcessor, QuotaTracker, RequestQueue, ShutdownController, StatusReporter,
};

/// The assembled motor service.
#[derive(Debug)]
pub struct MotorService {
    gate: AdmissionGate,
    shutdown: Arc<ShutdownController>,
    reporter: StatusReporter,
    processor: Option<QueueProcessor>,
}

impl MotorService {
    /// Wire the components around the given collaborators.
    ///
    /// The processor is not started; call [`MotorService::start`].
    pub fn new(
        settings: &MotorConfig,
        actuator: Arc<dyn Actuator>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let switch = MotorSwitch::new(actuator, settings.control_topic.clone());
        let shutdown = Arc::new(ShutdownController::new(switch.clone(), clock.clone()));
        let quota = Arc::new(QuotaTracker::new(
            settings.quota_limit(),
            settings.charge_mode,
            clock.clone(),
        ));
        let (queue, receiver) = RequestQueue::bounded(settings.queue_capacity);

        let gate = AdmissionGate::new(
            shutdown.clone(),
            quota.clone(),
            queue.clone(),
            audit,
            clock,
        );
        let reporter = StatusReporter::new(shutdown.clone(), quota.clone(), queue);
        let processor = QueueProcessor::new(receiver, shutdown.clone(), quota, switch);

        Self {
            gate,
            shutdown,
            reporter,
            processor: Some(processor),
        }
    }

    /// Build from configuration using the system clock.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let actuator = build_actuator(&config.actuator)?;
        let audit = build_audit(&config.audit).await?;

        info!(
            quota_limit_secs = config.motor.quota_limit_secs,
            queue_capacity = config.motor.queue_capacity,
            charge_mode = %config.motor.charge_mode,
            topic = %config.motor.control_topic,
            "Motor service configured"
        );

        Ok(Self::new(
            &config.motor,
            actuator,
            audit,
            Arc::new(SystemClock),
        ))
    }

    /// Spawn the queue processor. Returns `None` if it is already running.
    pub fn start(&mut self) -> Option<JoinHandle<()>> {
        self.processor.take().map(QueueProcessor::spawn)
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn shutdown(&self) -> &Arc<ShutdownController> {
        &self.shutdown
    }

    pub fn reporter(&self) -> &StatusReporter {
        &self.reporter
    }
}

/// Create the configured actuator.
pub fn build_actuator(config: &ActuatorConfig) -> Result<Arc<dyn Actuator>> {
    match config.kind.to_lowercase().as_str() {
        "log" => Ok(Arc::new(LogActuator::new())),
        "http" => {
            let url = config
                .url
                .as_deref()
                .context("HTTP actuator has no URL configured")?;
            let mut actuator = HttpActuator::new(url, config.timeout());
            if let Some(token) = &config.auth_token {
                actuator = actuator.with_auth_token(token);
            }
            Ok(Arc::new(actuator))
        }
        other => anyhow::bail!("Invalid actuator kind: {}", other),
    }
}

/// Create the configured audit store.
pub async fn build_audit(config: &AuditConfig) -> Result<Arc<dyn AuditLog>> {
    match config.kind.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryAuditLog::new())),
        "file" => {
            let path = config
                .path
                .as_deref()
                .context("File audit log has no path configured")?;
            let log = FileAuditLog::open(path)
                .await
                .with_context(|| format!("Failed to open audit log at {}", path))?;
            Ok(Arc::new(log))
        }
        other => anyhow::bail!("Invalid audit kind: {}", other),
    }
}
