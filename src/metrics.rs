//! Observability metrics for collection runs
//!
//! Counters and histograms are emitted through the `metrics` facade. They are
//! no-ops until [`init_metrics`] installs the Prometheus exporter, which serves a
//! scrape endpoint for the lifetime of the process.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info};

static METRICS_INITIALIZED: OnceCell<SocketAddr> = OnceCell::new();

/// Install the Prometheus exporter and register metric descriptions
///
/// Must be called from inside a Tokio runtime. Calling it again is a no-op.
///
/// # Arguments
/// * `addr` - Socket address for the scrape endpoint (e.g. "127.0.0.1:9090")
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(existing) = METRICS_INITIALIZED.get() {
        debug!(addr = %existing, "Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "slack_api_requests_total",
        Unit::Count,
        "Total number of HTTP requests made to the Slack Web API"
    );
    describe_histogram!(
        "slack_api_request_duration_seconds",
        Unit::Seconds,
        "Slack Web API request duration in seconds"
    );
    describe_counter!(
        "slack_api_errors_total",
        Unit::Count,
        "Total number of failed Slack Web API calls by error kind"
    );
    describe_counter!(
        "rate_limit_pauses_total",
        Unit::Count,
        "Total number of rate limiter sleeps by kind"
    );
    describe_counter!(
        "channels_stored_total",
        Unit::Count,
        "Total number of channels collected and stored"
    );
    describe_counter!(
        "channels_failed_total",
        Unit::Count,
        "Total number of channels recorded in the error ledger"
    );
    describe_counter!(
        "reactions_stored_total",
        Unit::Count,
        "Total number of reaction records stored"
    );
    describe_histogram!(
        "channel_collection_duration_seconds",
        Unit::Seconds,
        "Time spent collecting one channel"
    );

    let _ = METRICS_INITIALIZED.set(addr);
    info!("Metrics system initialized successfully");
    Ok(())
}

/// Whether the exporter has been installed
pub fn is_initialized() -> bool {
    METRICS_INITIALIZED.get().is_some()
}

/// Record a completed HTTP request
pub fn record_api_request(method: &str, status_code: u16, duration: Duration) {
    counter!(
        "slack_api_requests_total",
        "method" => method.to_string(),
        "status" => status_code.to_string(),
    )
    .increment(1);

    histogram!(
        "slack_api_request_duration_seconds",
        "method" => method.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record a failed API call
pub fn record_api_error(method: &str, kind: &'static str) {
    counter!(
        "slack_api_errors_total",
        "method" => method.to_string(),
        "kind" => kind,
    )
    .increment(1);
}

/// Record a rate limiter sleep
pub fn record_rate_limit_pause(kind: &'static str, delay: Duration) {
    counter!("rate_limit_pauses_total", "kind" => kind).increment(1);
    debug!(kind = kind, delay_secs = delay.as_secs_f64(), "Rate limiter pause");
}

/// Record a channel stored successfully
pub fn record_channel_stored(reactions: usize, duration: Duration) {
    counter!("channels_stored_total").increment(1);
    counter!("reactions_stored_total").increment(reactions as u64);
    histogram!("channel_collection_duration_seconds").record(duration.as_secs_f64());
}

/// Record a channel written to the error ledger
pub fn record_channel_failed(kind: &'static str) {
    counter!("channels_failed_total", "kind" => kind).increment(1);
}
