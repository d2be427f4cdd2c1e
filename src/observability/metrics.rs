//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_connections_total` (counter): access decisions by `decision`
//! - `gate_channel_failures_total` (counter): stream setup failures by `side`
//! - `gate_active_connections` (gauge): sessions currently running
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::net::validator::AccessDecision;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(decision: &AccessDecision) {
    metrics::counter!("gate_connections_total", "decision" => decision.verdict()).increment(1);
}

pub fn record_channel_failure(side: &'static str) {
    metrics::counter!("gate_channel_failures_total", "side" => side).increment(1);
}

pub fn set_active_connections(count: u64) {
    metrics::gauge!("gate_active_connections").set(count as f64);
}
