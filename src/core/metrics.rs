//! Metrics collection for the bot using Prometheus
//!
//! Tracks the upload funnel: photos received, uploads per host and outcome,
//! gate denials and evicted references. Rendered at `GET /metrics`.

// Registration only fails on duplicate metric names, which is a programming error.
#![allow(clippy::expect_used)]

use once_cell::sync::Lazy;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec, Encoder, TextEncoder};

/// Photos accepted for processing (after the gate)
pub static PHOTOS_RECEIVED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("imglinker_photos_received_total", "Photos accepted for upload")
        .expect("register imglinker_photos_received_total")
});

/// Upload attempts by destination and outcome
/// Labels: host (imgbb/envs/imgbox), outcome (success/failure)
pub static UPLOADS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "imglinker_uploads_total",
        "Upload attempts by host and outcome",
        &["host", "outcome"]
    )
    .expect("register imglinker_uploads_total")
});

/// Events rejected by the subscription gate
/// Labels: event (photo/selection/start)
pub static GATE_DENIALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "imglinker_gate_denials_total",
        "Events rejected because the user is not a channel member",
        &["event"]
    )
    .expect("register imglinker_gate_denials_total")
});

/// Abandoned references removed by the sweeper
pub static ASSETS_EVICTED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "imglinker_assets_evicted_total",
        "Abandoned image references evicted by the sweeper"
    )
    .expect("register imglinker_assets_evicted_total")
});

/// Records the outcome of a single upload attempt
pub fn record_upload(host: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    UPLOADS_TOTAL.with_label_values(&[host, outcome]).inc();
}

/// Touches every metric so they appear in /metrics with zero values
pub fn init_metrics() {
    log::info!("Initializing metrics registry...");
    Lazy::force(&PHOTOS_RECEIVED_TOTAL);
    Lazy::force(&UPLOADS_TOTAL);
    Lazy::force(&GATE_DENIALS_TOTAL);
    Lazy::force(&ASSETS_EVICTED_TOTAL);
}

/// Encodes the default registry in the Prometheus text format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        log::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
