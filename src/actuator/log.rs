// Dry-run actuator: commands only show up in the logs

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use super::Actuator;
use crate::error::PublishError;

#[derive(Debug, Clone, Default)]
pub struct LogActuator;

impl LogActuator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Actuator for LogActuator {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        info!(
            topic,
            payload = %String::from_utf8_lossy(&payload),
            "Actuator publish (dry run)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_actuator_always_succeeds() {
        let actuator = LogActuator::new();
        assert!(actuator
            .publish("motor/control", Bytes::from_static(b"on"))
            .await
            .is_ok());
    }
}
