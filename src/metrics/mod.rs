//! Prometheus metrics for rendering and test-send diagnostics.
//!
//! - Slot render results (ok / err)
//! - Send outcome classifications by kind

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "template";

lazy_static! {
    /// Rendered content slots by result
    pub static ref SLOTS_RENDERED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_slots_rendered_total", METRIC_PREFIX),
        "Total content slots rendered",
        &["result"]
    ).unwrap();

    /// Classified test-send outcomes by kind
    pub static ref SEND_OUTCOMES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_send_outcomes_total", METRIC_PREFIX),
        "Total test-send outcomes by kind and classification",
        &["kind", "classified"]
    ).unwrap();
}

/// Helpers for render metrics
pub struct RenderMetrics;

impl RenderMetrics {
    pub fn slot_rendered() {
        SLOTS_RENDERED_TOTAL.with_label_values(&["ok"]).inc();
    }

    pub fn slot_failed() {
        SLOTS_RENDERED_TOTAL.with_label_values(&["err"]).inc();
    }
}

/// Helpers for diagnostics metrics
pub struct DiagnosticMetrics;

impl DiagnosticMetrics {
    pub fn classified(kind: &str) {
        SEND_OUTCOMES_TOTAL.with_label_values(&[kind, "true"]).inc();
    }

    pub fn unclassified(kind: &str) {
        SEND_OUTCOMES_TOTAL.with_label_values(&[kind, "false"]).inc();
    }
}

/// Encode all registered metrics in the Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_exported() {
        RenderMetrics::slot_rendered();
        DiagnosticMetrics::classified("provider_not_found");

        let output = encode_metrics().unwrap();
        assert!(output.contains("template_slots_rendered_total"));
        assert!(output.contains("template_send_outcomes_total"));
    }
}
