//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define fleet metrics (transactions, retries, cycles, rewards)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `odyssey_transactions_total` (counter): transactions by phase, outcome
//! - `odyssey_confirm_retries_total` (counter): confirmation re-checks
//! - `odyssey_cycles_completed_total` (counter): finished daily cycles
//! - `odyssey_cycle_failures_total` (counter): failed cycles by error kind
//! - `odyssey_milestones_claimed_total` (counter): claims by stage
//! - `odyssey_mystery_boxes_opened_total` (counter)
//! - `odyssey_accounts_active` (gauge): running orchestrators
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transaction(phase: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    counter!("odyssey_transactions_total", "phase" => phase, "outcome" => outcome).increment(1);
}

pub fn record_confirm_retry() {
    counter!("odyssey_confirm_retries_total").increment(1);
}

pub fn record_cycle_completed() {
    counter!("odyssey_cycles_completed_total").increment(1);
}

pub fn record_cycle_failure(kind: &'static str) {
    counter!("odyssey_cycle_failures_total", "kind" => kind).increment(1);
}

pub fn record_milestone(stage: u8) {
    counter!("odyssey_milestones_claimed_total", "stage" => stage.to_string()).increment(1);
}

pub fn record_mystery_box() {
    counter!("odyssey_mystery_boxes_opened_total").increment(1);
}

pub fn account_started() {
    gauge!("odyssey_accounts_active").increment(1.0);
}

pub fn account_stopped() {
    gauge!("odyssey_accounts_active").decrement(1.0);
}
