// Configuration File Support
//
// TOML configuration for the motorgate service, with MOTORGATE_* environment
// variable overrides. Without an explicit path the file is looked up at
// $MOTORGATE_CONFIG, then ~/.config/motorgate/config.toml.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::actuator::DEFAULT_CONTROL_TOPIC;
use crate::motor::{ChargeMode, DEFAULT_QUEUE_CAPACITY, DEFAULT_QUOTA_LIMIT};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Quota, queue and accounting settings
    pub motor: MotorConfig,

    /// Device transport
    pub actuator: ActuatorConfig,

    /// Activation audit storage
    pub audit: AuditConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP API listens on
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotorConfig {
    /// Motor-on seconds allowed per 24h window
    pub quota_limit_secs: u64,

    /// Maximum number of waiting requests
    pub queue_capacity: usize,

    /// Dequeue-time accounting (single or double)
    pub charge_mode: ChargeMode,

    /// Topic the on/off commands are published to
    pub control_topic: String,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            quota_limit_secs: DEFAULT_QUOTA_LIMIT.as_secs(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            charge_mode: ChargeMode::default(),
            control_topic: DEFAULT_CONTROL_TOPIC.to_string(),
        }
    }
}

impl ActuatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MotorConfig {
    pub fn quota_limit(&self) -> Duration {
        Duration::from_secs(self.quota_limit_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Transport kind (log, http)
    pub kind: String,

    /// Bridge endpoint for the http kind
    pub url: Option<String>,

    /// Publish timeout in seconds
    pub timeout_secs: u64,

    /// Bearer token sent to the bridge
    pub auth_token: Option<String>,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            kind: "log".to_string(),
            url: None,
            timeout_secs: 5,
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    /// Storage kind (memory, file)
    pub kind: String,

    /// JSON lines file for the file kind
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            kind: "memory".to_string(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve /metrics on the API listener
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::config_path())
    }

    /// Load configuration from a file.
    ///
    /// A missing file yields the defaults (still subject to env overrides).
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file from {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file from {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Default configuration file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("MOTORGATE_CONFIG") {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".config")
            .join("motorgate")
            .join("config.toml")
    }

    fn apply_env_overrides(mut self) -> Self {
        // Logging overrides
        if let Ok(level) = std::env::var("MOTORGATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("MOTORGATE_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(addr) = std::env::var("MOTORGATE_BIND_ADDR") {
            if !addr.is_empty() {
                self.server.bind_addr = addr;
            }
        }

        // Motor overrides
        if let Ok(limit) = std::env::var("MOTORGATE_QUOTA_LIMIT_SECS") {
            if let Ok(limit) = limit.parse::<u64>() {
                if limit > 0 {
                    self.motor.quota_limit_secs = limit;
                }
            }
        }
        if let Ok(capacity) = std::env::var("MOTORGATE_QUEUE_CAPACITY") {
            if let Ok(capacity) = capacity.parse::<usize>() {
                if capacity > 0 {
                    self.motor.queue_capacity = capacity;
                }
            }
        }
        if let Ok(mode) = std::env::var("MOTORGATE_CHARGE_MODE") {
            if let Ok(mode) = mode.parse::<ChargeMode>() {
                self.motor.charge_mode = mode;
            }
        }
        if let Ok(topic) = std::env::var("MOTORGATE_CONTROL_TOPIC") {
            if !topic.is_empty() {
                self.motor.control_topic = topic;
            }
        }

        // Collaborator overrides
        if let Ok(kind) = std::env::var("MOTORGATE_ACTUATOR_KIND") {
            self.actuator.kind = kind;
        }
        if let Ok(url) = std::env::var("MOTORGATE_ACTUATOR_URL") {
            self.actuator.url = Some(url);
        }
        if let Ok(token) = std::env::var("MOTORGATE_ACTUATOR_TOKEN") {
            self.actuator.auth_token = Some(token);
        }
        if let Ok(kind) = std::env::var("MOTORGATE_AUDIT_KIND") {
            self.audit.kind = kind;
        }
        if let Ok(path) = std::env::var("MOTORGATE_AUDIT_PATH") {
            self.audit.path = Some(path);
        }

        // Metrics overrides
        if let Ok(enabled) = std::env::var("MOTORGATE_METRICS_ENABLED") {
            self.metrics.enabled = enabled.parse().unwrap_or(self.metrics.enabled);
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        if self.server.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            anyhow::bail!("Invalid bind address: {}", self.server.bind_addr);
        }

        if self.motor.quota_limit_secs == 0 {
            anyhow::bail!("Quota limit must be > 0 seconds");
        }
        if self.motor.queue_capacity == 0 {
            anyhow::bail!("Queue capacity must be > 0");
        }
        if self.motor.control_topic.is_empty() {
            anyhow::bail!("Control topic must not be empty");
        }

        match self.actuator.kind.to_lowercase().as_str() {
            "log" => {}
            "http" => {
                if self.actuator.url.is_none() {
                    anyhow::bail!("HTTP actuator has no URL configured");
                }
            }
            _ => anyhow::bail!(
                "Invalid actuator kind: {}. Must be 'log' or 'http'",
                self.actuator.kind
            ),
        }
        if self.actuator.timeout_secs == 0 {
            anyhow::bail!("Actuator timeout must be > 0 seconds");
        }

        match self.audit.kind.to_lowercase().as_str() {
            "memory" => {}
            "file" => {
                if self.audit.path.is_none() {
                    anyhow::bail!("File audit log has no path configured");
                }
            }
            _ => anyhow::bail!(
                "Invalid audit kind: {}. Must be 'memory' or 'file'",
                self.audit.kind
            ),
        }

        Ok(())
    }

    /// Copy safe to print: secrets are masked.
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        if config.actuator.auth_token.is_some() {
            config.actuator.auth_token = Some(REDACTED.to_string());
        }
        config
    }
}

/// Placeholder for masked secrets
pub const REDACTED: &str = "<redacted>";
