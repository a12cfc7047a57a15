//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define request metrics (count, latency, handler failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `modkit_requests_total` (counter): requests by method, status, route
//! - `modkit_request_duration_seconds` (histogram): latency distribution
//! - `modkit_handler_failures_total` (counter): handler errors by route
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Unmatched requests are labelled with route `"fallback"`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "modkit_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "modkit_request_duration_seconds";
pub const HANDLER_FAILURES_TOTAL: &str = "modkit_handler_failures_total";

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(REQUESTS_TOTAL, "Requests handled, by method, status and route");
    describe_histogram!(REQUEST_DURATION_SECONDS, Unit::Seconds, "Time spent handling a request");
    describe_counter!(HANDLER_FAILURES_TOTAL, "Handler errors routed to an error handler");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_handler_failure(route: &str) {
    counter!(HANDLER_FAILURES_TOTAL, "route" => route.to_string()).increment(1);
}
