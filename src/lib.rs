//! Motorgate Library
//!
//! Quota-gated, operator-overridable queue of timed motor-on requests.
//! Requests are admitted against a rolling daily budget, recorded in an
//! audit log, and executed one at a time by publishing `on` / `off` commands
//! to a device control topic.

pub mod actuator;
pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod motor;
pub mod service;

pub use error::{AdmissionError, PublishError, StorageError};
pub use service::MotorService;
