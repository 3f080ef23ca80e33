// Prometheus metrics for the motor gate
//
// Exposed on the /metrics HTTP endpoint:
// - Admission outcomes (counters)
// - Dequeue-time drops (counter)
// - Queue depth and quota usage (gauges)
// - Motor run durations (histogram)

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Gauge, Histogram, IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder,
};
use std::sync::Arc;

lazy_static! {
    pub static ref REGISTRY: Arc<Registry> = Arc::new(Registry::new());

    // Admission metrics
    pub static ref ADMISSIONS_TOTAL: IntCounter = IntCounter::new(
        "motor_admissions_total",
        "Total number of motor requests admitted to the queue"
    ).expect("Failed to create admissions metric");

    pub static ref REJECTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("motor_rejections_total", "Total number of rejected motor requests"),
        &["reason"]
    ).expect("Failed to create rejections metric");

    // Processing metrics
    pub static ref DEQUEUE_DROPS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("motor_dequeue_drops_total", "Queued requests dropped at execution time"),
        &["reason"]
    ).expect("Failed to create dequeue drops metric");

    pub static ref EXECUTIONS_TOTAL: IntCounter = IntCounter::new(
        "motor_executions_total",
        "Total number of motor runs started"
    ).expect("Failed to create executions metric");

    pub static ref MOTOR_RUN_SECONDS: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new("motor_run_seconds", "Actual motor-on hold time in seconds")
            .buckets(vec![1.0, 10.0, 60.0, 300.0, 600.0, 1800.0, 3600.0]),
    ).expect("Failed to create motor run metric");

    pub static ref ACTUATOR_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("actuator_publish_failures_total", "Failed actuator publishes"),
        &["payload"]
    ).expect("Failed to create actuator failures metric");

    // State metrics
    pub static ref QUEUE_DEPTH: IntGauge = IntGauge::new(
        "motor_queue_depth",
        "Number of admitted requests waiting to run"
    ).expect("Failed to create queue depth metric");

    pub static ref QUOTA_USED_SECONDS: Gauge = Gauge::new(
        "motor_quota_used_seconds",
        "Motor-on seconds charged in the current quota window"
    ).expect("Failed to create quota usage metric");

    pub static ref SHUTDOWN_ACTIVE: IntGauge = IntGauge::new(
        "motor_shutdown_active",
        "1 while an operator shutdown is in effect"
    ).expect("Failed to create shutdown metric");

    pub static ref SHUTDOWN_TRANSITIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("motor_shutdown_transitions_total", "Operator shutdown/restart transitions"),
        &["to"]
    ).expect("Failed to create shutdown transitions metric");
}

/// Register every metric with the registry.
///
/// Safe to call more than once; already-registered collectors are skipped.
pub fn init() -> prometheus::Result<()> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ADMISSIONS_TOTAL.clone()),
        Box::new(REJECTIONS_TOTAL.clone()),
        Box::new(DEQUEUE_DROPS_TOTAL.clone()),
        Box::new(EXECUTIONS_TOTAL.clone()),
        Box::new(MOTOR_RUN_SECONDS.clone()),
        Box::new(ACTUATOR_FAILURES_TOTAL.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        Box::new(QUOTA_USED_SECONDS.clone()),
        Box::new(SHUTDOWN_ACTIVE.clone()),
        Box::new(SHUTDOWN_TRANSITIONS_TOTAL.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| anyhow::anyhow!("Invalid UTF-8 in metrics: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        assert!(init().is_ok());
        assert!(init().is_ok());
    }

    #[test]
    fn test_gather_includes_motor_metrics() {
        init().unwrap();
        ADMISSIONS_TOTAL.inc();
        REJECTIONS_TOTAL.with_label_values(&["queue_full"]).inc();

        let text = gather_metrics().unwrap();
        assert!(text.contains("motor_admissions_total"));
        assert!(text.contains("motor_rejections_total"));
    }
}
