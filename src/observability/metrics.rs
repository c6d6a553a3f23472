//! Request metrics.
//!
//! # Metrics
//! - `http_server_requests_total` (counter): requests by method, status
//! - `http_server_request_duration_seconds` (histogram): latency
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. `init_metrics` installs the Prometheus exporter
//! with its own HTTP listener.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{Error, Result};

pub const REQUESTS_TOTAL: &str = "http_server_requests_total";
pub const REQUEST_DURATION: &str = "http_server_request_duration_seconds";

/// Install the Prometheus recorder and scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| Error::Metrics(e.to_string()))?;

    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(REQUESTS_TOTAL, "method" => method.to_string(), "status" => status.clone())
        .increment(1);
    histogram!(REQUEST_DURATION, "method" => method.to_string(), "status" => status)
        .record(start.elapsed().as_secs_f64());
}
