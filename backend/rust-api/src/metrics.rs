use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};
use std::time::Duration;

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Analysis Metrics
    pub static ref ANALYSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "analyses_total",
        "Analyses served, by the path that produced the response",
        &["path"]
    )
    .unwrap();

    pub static ref HEURISTIC_RULE_HITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "heuristic_rule_hits_total",
        "Fast-path heuristic matches",
        &["rule"]
    )
    .unwrap();

    // Provider Metrics
    pub static ref LLM_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "llm_calls_total",
        "Chat-completion calls, by outcome",
        &["outcome"]
    )
    .unwrap();

    pub static ref LLM_CALL_DURATION_SECONDS: Histogram = register_histogram!(
        "llm_call_duration_seconds",
        "Chat-completion call duration in seconds",
        vec![0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 6.0, 8.0, 10.0, 15.0]
    )
    .unwrap();

    pub static ref NORMALIZATION_ISSUES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "normalization_issues_total",
        "Model reply fields replaced by defaults",
        &["field", "reason"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// `path` is one of `rule`, `llm`, `fallback`.
pub fn record_analysis(path: &str) {
    ANALYSES_TOTAL.with_label_values(&[path]).inc();
}

pub fn record_rule_hit(rule: &str) {
    HEURISTIC_RULE_HITS_TOTAL.with_label_values(&[rule]).inc();
}

pub fn record_llm_call(outcome: &str, elapsed: Duration) {
    LLM_CALLS_TOTAL.with_label_values(&[outcome]).inc();
    LLM_CALL_DURATION_SECONDS.observe(elapsed.as_secs_f64());
}

pub fn record_normalization_issue(field: &str, reason: &str) {
    NORMALIZATION_ISSUES_TOTAL
        .with_label_values(&[field, reason])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let _ = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .get();
        let _ = ANALYSES_TOTAL.with_label_values(&["rule"]).get();
    }

    #[test]
    fn test_render_metrics() {
        record_analysis("fallback");
        record_llm_call("timeout", Duration::from_millis(5));
        record_normalization_issue("status", "invalid_value");

        let output = render_metrics().unwrap();
        assert!(output.contains("analyses_total"));
        assert!(output.contains("llm_calls_total"));
        assert!(output.contains("normalization_issues_total"));
    }
}
