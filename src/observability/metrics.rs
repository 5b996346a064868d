//! Metrics collection and exposition.
//!
//! # Metrics
//! - `grash_http_requests_total` (counter): requests by method, status
//! - `grash_http_request_duration_seconds` (histogram): latency by method
//! - `grash_shutdown_task_duration_seconds` (histogram): teardown time by task, outcome
//! - `grash_shutdown_deadline_exceeded_total` (counter): closes that hit the deadline
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one served HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "grash_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "grash_http_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record how long one shutdown task took and how it ended.
pub fn record_shutdown_task(task: &str, outcome: &'static str, elapsed: Duration) {
    ::metrics::histogram!(
        "grash_shutdown_task_duration_seconds",
        "task" => task.to_string(),
        "outcome" => outcome
    )
    .record(elapsed.as_secs_f64());
}

/// Record a close that gave up at the deadline.
pub fn record_deadline_exceeded() {
    ::metrics::counter!("grash_shutdown_deadline_exceeded_total").increment(1);
}
