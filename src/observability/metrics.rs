//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by endpoint, status
//! - `relay_request_duration_seconds` (histogram): time until the response
//!   head is ready (first byte for streams)
//! - `relay_stream_chunks_total` / `relay_stream_bytes_total` (counters)
//! - `relay_stream_cancelled_total` (counter): streams abandoned by the client
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::upstream::Endpoint;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: Endpoint, status: u16, start: Instant) {
    counter!(
        "relay_requests_total",
        "endpoint" => endpoint.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("relay_request_duration_seconds", "endpoint" => endpoint.as_str())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_stream_chunk(bytes: usize) {
    counter!("relay_stream_chunks_total").increment(1);
    counter!("relay_stream_bytes_total").increment(bytes as u64);
}

pub fn record_stream_cancelled() {
    counter!("relay_stream_cancelled_total").increment(1);
}
