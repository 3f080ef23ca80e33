// HTTP bridge actuator
//
// Forwards each publish as a JSON POST to a messaging bridge that owns the
// broker connection:
//
//   POST <url>  {"topic": "motor/control", "payload": "on"}
//
// Any 2xx answer counts as delivered. Nothing is retried here.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

use super::Actuator;
use crate::error::PublishError;

/// Body sent to the bridge
#[derive(Debug, Serialize)]
struct PublishBody<'a> {
    topic: &'a str,
    payload: String,
}

/// Actuator that publishes through an HTTP messaging bridge
#[derive(Debug, Clone)]
pub struct HttpActuator {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    auth_token: Option<String>,
}

impl HttpActuator {
    /// Create a bridge actuator
    ///
    /// # Arguments
    /// * `url` - Bridge publish endpoint
    /// * `timeout` - Per-publish timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
            auth_token: None,
        }
    }

    /// Send a bearer token with every publish
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

#[async_trait]
impl Actuator for HttpActuator {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        let body = PublishBody {
            topic,
            payload: String::from_utf8_lossy(&payload).into_owned(),
        };
        let start = Instant::now();

        let mut request = self.client.post(&self.url).timeout(self.timeout).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                PublishError::Timeout(self.timeout.as_millis() as u64)
            } else {
                PublishError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        debug!(
            "Bridge publish to {} - status {}, time {} ms",
            topic,
            status,
            start.elapsed().as_millis()
        );

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PublishError::Rejected {
                topic: topic.to_string(),
                status,
            })
        }
    }
}
