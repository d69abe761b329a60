//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_table_reloads_total` (counter): successful table loads
//! - `gateway_table_load_failures_total` (counter): loads replaced by an empty table
//! - `gateway_table_entries` (gauge): entries in the last loaded table
//! - `gateway_import_outcomes_total` (counter): import dispatch results

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!("gateway_requests_total", "route" => route, "status" => status.to_string())
        .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_table_reload(table: &str, entries: usize) {
    metrics::counter!("gateway_table_reloads_total", "table" => table.to_string()).increment(1);
    metrics::gauge!("gateway_table_entries", "table" => table.to_string()).set(entries as f64);
}

pub fn record_table_failure(table: &str) {
    metrics::counter!("gateway_table_load_failures_total", "table" => table.to_string())
        .increment(1);
    metrics::gauge!("gateway_table_entries", "table" => table.to_string()).set(0.0);
}

pub fn record_import(outcome: &'static str) {
    metrics::counter!("gateway_import_outcomes_total", "outcome" => outcome).increment(1);
}
