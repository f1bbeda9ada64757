//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lifecycle_events_total` (counter): lifecycle events by kind
//! - `scheduler_running` (gauge): 1 while the scheduler run loop is active
//! - `scheduler_failures_total` (counter): supervised runs that ended in error
//! - `shutdown_duration_seconds` (histogram): time spent in the shutdown sequence

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_lifecycle_event(event: &'static str) {
    metrics::counter!("lifecycle_events_total", "event" => event).increment(1);
}

pub fn set_scheduler_running(running: bool) {
    metrics::gauge!("scheduler_running").set(if running { 1.0 } else { 0.0 });
}

pub fn record_scheduler_failure() {
    metrics::counter!("scheduler_failures_total").increment(1);
}

pub fn record_shutdown_duration(elapsed: Duration) {
    metrics::histogram!("shutdown_duration_seconds").record(elapsed.as_secs_f64());
}
