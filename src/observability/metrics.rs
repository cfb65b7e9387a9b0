//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wallet_transactions_total` (counter): state-changing requests by operation, outcome
//! - `wallet_confirmation_seconds` (histogram): submit-to-receipt latency
//! - `wallet_ledger_calls_total` (counter): read-only calls by method, result
//! - `wallet_ledger_health` (gauge): 1=reachable, 0=unreachable
//! - `wallet_http_requests_total` (counter): HTTP requests by route, status
//!
//! Without an installed recorder every call here is a no-op, so tests need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a state-changing request by its final outcome.
pub fn record_transaction(operation: &'static str, outcome: &'static str) {
    counter!("wallet_transactions_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

/// Record time from submission to a resolved receipt.
pub fn record_confirmation_latency(operation: &'static str, submitted_at: Instant) {
    histogram!("wallet_confirmation_seconds", "operation" => operation)
        .record(submitted_at.elapsed().as_secs_f64());
}

/// Count a read-only ledger call.
pub fn record_ledger_call(method: &'static str, result: &'static str) {
    counter!("wallet_ledger_calls_total", "method" => method, "result" => result).increment(1);
}

/// Record ledger node reachability.
pub fn record_ledger_health(healthy: bool) {
    gauge!("wallet_ledger_health").set(if healthy { 1.0 } else { 0.0 });
}

/// Count a served HTTP request.
pub fn record_request(route: &str, status: u16) {
    counter!("wallet_http_requests_total", "route" => route.to_string(), "status" => status.to_string())
        .increment(1);
}
