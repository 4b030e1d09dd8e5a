//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hospfin_requests_total` (counter): responses by status class
//! - `hospfin_rate_limited_total` (counter): 429s by route
//! - `hospfin_auth_denied_total` (counter): 401/403 by reason
//! - `hospfin_audit_dropped_total` (counter): audit entries lost

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(err) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::error!(address = %addr, error = %err, "failed to install metrics exporter");
        return;
    }

    describe_counter!("hospfin_requests_total", "Responses by status class");
    describe_counter!("hospfin_rate_limited_total", "Requests rejected with 429");
    describe_counter!("hospfin_auth_denied_total", "Requests rejected with 401/403");
    describe_counter!("hospfin_audit_dropped_total", "Audit entries that were lost");

    tracing::info!(address = %addr, "metrics exporter listening");
}

pub fn record_request(status: u16) {
    let class = match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!("hospfin_requests_total", "class" => class).increment(1);
}

pub fn record_rate_limited(route: &str) {
    counter!("hospfin_rate_limited_total", "route" => route.to_string()).increment(1);
}

pub fn record_auth_denied(reason: &'static str) {
    counter!("hospfin_auth_denied_total", "reason" => reason).increment(1);
}

pub fn record_audit_dropped() {
    counter!("hospfin_audit_dropped_total").increment(1);
}
