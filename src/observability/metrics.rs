//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bff_upstream_requests_total` (counter): upstream calls by resource, status (0 = transport failure)
//! - `bff_upstream_duration_seconds` (histogram): upstream latency by resource
//! - `bff_cache_lookups_total` (counter): cache lookups by resource, result (hit/miss)
//! - `bff_backoff_events_total` (counter): backoff events by resource, event (recorded/rejected)
//! - `bff_token_requests_total` (counter): OAuth token calls by grant, status

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

/// Start the Prometheus scrape listener and install it as the global recorder.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_upstream(resource: &str, status: u16, elapsed: Duration) {
    ::metrics::counter!(
        "bff_upstream_requests_total",
        "resource" => resource.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("bff_upstream_duration_seconds", "resource" => resource.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_cache_lookup(resource: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    ::metrics::counter!(
        "bff_cache_lookups_total",
        "resource" => resource.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_backoff_event(resource: &str, event: &'static str) {
    ::metrics::counter!(
        "bff_backoff_events_total",
        "resource" => resource.to_string(),
        "event" => event
    )
    .increment(1);
}

pub fn record_token_request(grant: &'static str, status: u16) {
    ::metrics::counter!(
        "bff_token_requests_total",
        "grant" => grant,
        "status" => status.to_string()
    )
    .increment(1);
}
