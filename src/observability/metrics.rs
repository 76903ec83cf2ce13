//! Metrics collection and exposition.
//!
//! # Metrics
//! - `app_requests_total` (counter): requests by method, route template, status
//! - `app_request_duration_seconds` (histogram): latency distribution
//! - `app_in_flight_requests` (gauge): requests currently being served
//! - `app_draining` (gauge): 1 once a graceful shutdown has begun
//! - `app_health_checks_total` (counter): health responses by status
//!
//! Without an installed recorder every call here is a no-op, which keeps
//! tests and metrics-disabled deployments free of setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// `route` must be a bounded label (a route template or `"unmatched"`), never
/// the raw request path.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "app_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "app_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn set_in_flight(count: u64) {
    gauge!("app_in_flight_requests").set(count as f64);
}

pub fn set_draining(draining: bool) {
    gauge!("app_draining").set(if draining { 1.0 } else { 0.0 });
}

pub fn record_health(status: u16) {
    counter!("app_health_checks_total", "status" => status.to_string()).increment(1);
}
