//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define exchange metrics (request count, latency, fatal outcomes)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `switchyard_requests_total` (counter): exchanges by method, status
//! - `switchyard_request_duration_seconds` (histogram): dispatch latency
//! - `switchyard_fatal_exchanges_total` (counter): exchanges no error handler recovered
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels stay low-cardinality (no paths)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count one exchange and record its latency.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "switchyard_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "switchyard_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Count an exchange that ended without recovery.
pub fn record_fatal(method: &str) {
    metrics::counter!(
        "switchyard_fatal_exchanges_total",
        "method" => method.to_string()
    )
    .increment(1);
}
