//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rescue_attempts_total` (counter): bundles prepared
//! - `rescue_bundles_submitted_total` (counter): bundles accepted by the relay
//! - `rescue_transient_failures_total` (counter): retried RPC/relay failures, by stage
//! - `rescue_inclusion_results_total` (counter): inclusion checks, by status
//! - `rescue_max_fee_per_gas_wei` (gauge): fee cap of the current attempt

use alloy::primitives::U256;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::relay::InclusionStatus;

/// Install the Prometheus exporter on `addr`. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_attempt(max_fee_per_gas: U256) {
    metrics::counter!("rescue_attempts_total").increment(1);
    let wei = u128::try_from(max_fee_per_gas).unwrap_or(u128::MAX);
    metrics::gauge!("rescue_max_fee_per_gas_wei").set(wei as f64);
}

pub fn record_bundle_submitted() {
    metrics::counter!("rescue_bundles_submitted_total").increment(1);
}

pub fn record_transient_failure(stage: &'static str) {
    metrics::counter!("rescue_transient_failures_total", "stage" => stage).increment(1);
}

pub fn record_inclusion(status: InclusionStatus) {
    let label = match status {
        InclusionStatus::Included => "included",
        InclusionStatus::BlockPassedWithoutInclusion => "block_passed",
        InclusionStatus::AccountNonceTooHigh => "nonce_too_high",
    };
    metrics::counter!("rescue_inclusion_results_total", "status" => label).increment(1);
}
