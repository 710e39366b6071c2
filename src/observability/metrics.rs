//! Metrics collection and exposition.
//!
//! # Metrics
//! - `infisical_fetch_attempts_total` (counter): backend attempts by outcome
//! - `infisical_refresh_total` (counter): refresh cycles by outcome
//! - `infisical_reloads_total` (counter): published snapshot changes
//! - `infisical_snapshot_entries` (gauge): entries in the current snapshot
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - Keys and values of secrets never become labels

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// One attempt against the backend (`success`, `transient`, `unauthorized`).
pub fn record_fetch_attempt(outcome: &'static str) {
    metrics::counter!("infisical_fetch_attempts_total", "outcome" => outcome).increment(1);
}

/// One refresh cycle (`unchanged`, `changed`, `failed`, `timeout`).
pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("infisical_refresh_total", "outcome" => outcome).increment(1);
}

/// A new snapshot was published.
pub fn record_reload(entries: usize) {
    metrics::counter!("infisical_reloads_total").increment(1);
    record_snapshot_size(entries);
}

pub fn record_snapshot_size(entries: usize) {
    metrics::gauge!("infisical_snapshot_entries").set(entries as f64);
}
