//! Metrics definitions for the gatekeeper service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gk_` prefix
//! - `_total` suffix for counters

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Record an intercepted call.
///
/// Metric: `gk_calls_total`
/// Labels: `shape` (unary, streaming), `outcome` (allowed, denied)
pub fn record_call(shape: &'static str, outcome: &'static str) {
    counter!("gk_calls_total", "shape" => shape, "outcome" => outcome).increment(1);
}

/// Record a refused call.
///
/// Metric: `gk_access_denied_total`
/// Labels: `reason`
pub fn record_access_denied(reason: &'static str) {
    counter!("gk_access_denied_total", "reason" => reason).increment(1);
}

/// Record one message fanned out on a feed.
///
/// Metric: `gk_feed_messages_total`
/// Labels: `feed`
pub fn record_feed_message(feed: &'static str) {
    counter!("gk_feed_messages_total", "feed" => feed).increment(1);
}

/// Set the number of subscriber queues registered on a feed.
///
/// Metric: `gk_feed_subscribers`
/// Labels: `feed`
pub fn set_feed_subscribers(feed: &'static str, count: usize) {
    // usize to f64 conversion is safe for realistic subscriber counts (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("gk_feed_subscribers", "feed" => feed).set(count as f64);
}

/// Record subscribers removed after their receiver went away.
///
/// Metric: `gk_feed_subscribers_removed_total`
/// Labels: `feed`
pub fn record_subscribers_removed(feed: &'static str, count: usize) {
    counter!("gk_feed_subscribers_removed_total", "feed" => feed).increment(count as u64);
}

/// Record a statistics snapshot handed to a caller.
///
/// Metric: `gk_stats_flushes_total`
pub fn record_stats_flush() {
    counter!("gk_stats_flushes_total").increment(1);
}
