//! Pipeline metrics.
//!
//! Recording is a no-op until a recorder is installed; the binary installs a
//! Prometheus exporter when `METRICS_ADDR` is set.

use std::net::SocketAddr;
use tracing::{info, warn};

pub struct PipelineMetrics;

impl PipelineMetrics {
    /// Record which path produced a parse result (`mock`, `vision`, `text_only`, `failed`).
    pub fn record_parse(path: &'static str) {
        ::metrics::counter!("event_vibe_parse_total", "path" => path).increment(1);
    }

    /// Record a degraded transition (`mock`, `text_only`, `placeholder`).
    pub fn record_fallback(stage: &'static str) {
        ::metrics::counter!("event_vibe_fallback_total", "stage" => stage).increment(1);
    }

    pub fn record_retry(context: &'static str) {
        ::metrics::counter!("event_vibe_retry_total", "context" => context).increment(1);
    }

    pub fn record_capture_duration(duration_secs: f64) {
        ::metrics::histogram!("event_vibe_capture_duration_seconds").record(duration_secs);
    }
}

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: &str) {
    let Ok(addr) = addr.parse::<SocketAddr>() else {
        warn!("Invalid metrics address '{}', metrics disabled", addr);
        return;
    };

    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Failed to install Prometheus exporter: {}", e),
    }
}
