//! Prometheus metrics for the block message verifier.
//!
//! All metrics follow the naming convention: `bmv_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

use crate::TelemetryError;

lazy_static! {
    /// Verifier metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Relay messages handled, by outcome
    pub static ref RELAY_MESSAGES: IntCounterVec = IntCounterVec::new(
        Opts::new("bmv_relay_messages_total", "Relay messages handled"),
        &["outcome"]  // outcome: accepted/already_verified/not_verifiable/rejected
    ).expect("metric creation failed");

    /// Block updates accepted
    pub static ref BLOCK_UPDATES_VERIFIED: IntCounter = IntCounter::new(
        "bmv_block_updates_verified_total",
        "Block updates that passed quorum verification"
    ).expect("metric creation failed");

    /// Validator set rotations applied
    pub static ref VALIDATOR_ROTATIONS: IntCounter = IntCounter::new(
        "bmv_validator_rotations_total",
        "Validator set rotations applied"
    ).expect("metric creation failed");

    /// Messages extracted for the message center
    pub static ref MESSAGES_EXTRACTED: IntCounter = IntCounter::new(
        "bmv_messages_extracted_total",
        "Messages extracted from verified batches"
    ).expect("metric creation failed");

    /// Distinct signatures per accepted decision
    pub static ref QUORUM_SIGNATURES: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "bmv_quorum_signatures",
            "Distinct validator signatures per accepted decision"
        ).buckets(vec![1.0, 2.0, 4.0, 7.0, 10.0, 16.0, 25.0, 50.0, 100.0])
    ).expect("metric creation failed");

    /// Last verified source chain height
    pub static ref LINK_HEIGHT: IntGauge = IntGauge::new(
        "bmv_link_height",
        "Last verified source chain height"
    ).expect("metric creation failed");
}

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Register all metrics with [`REGISTRY`]. Safe to call repeatedly; every
/// call reports the outcome of the first registration.
pub fn register_metrics() -> Result<(), TelemetryError> {
    registration_outcome(&REGISTERED, || register_into(&REGISTRY))
}

fn registration_outcome(
    cell: &OnceLock<Result<(), String>>,
    register: impl FnOnce() -> Result<(), String>,
) -> Result<(), TelemetryError> {
    cell.get_or_init(register)
        .clone()
        .map_err(TelemetryError::MetricsInit)
}

fn register_into(registry: &Registry) -> Result<(), String> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(RELAY_MESSAGES.clone()),
        Box::new(BLOCK_UPDATES_VERIFIED.clone()),
        Box::new(VALIDATOR_ROTATIONS.clone()),
        Box::new(MESSAGES_EXTRACTED.clone()),
        Box::new(QUORUM_SIGNATURES.clone()),
        Box::new(LINK_HEIGHT.clone()),
    ];
    for metric in metrics {
        registry.register(metric).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Render all metrics in the Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    register_metrics()?;
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
