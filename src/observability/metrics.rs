//! Metrics collection and exposition.
//!
//! # Metrics
//! - `skew_decisions_total` (counter): decisions by outcome label
//! - `skew_reroute_requests_total` (counter): rerouted requests by sibling status
//! - `skew_reroute_failures_total` (counter): reroutes that never got a response
//! - `skew_reroute_duration_seconds` (histogram): time to the sibling's response head

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(decision: &'static str) {
    counter!("skew_decisions_total", "decision" => decision).increment(1);
}

pub fn record_reroute(status: u16, start: Instant) {
    counter!("skew_reroute_requests_total", "status" => status.to_string()).increment(1);
    histogram!("skew_reroute_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_reroute_failure() {
    counter!("skew_reroute_failures_total").increment(1);
}
