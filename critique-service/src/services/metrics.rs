//! Prometheus metrics for critique-service.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// The registry together with every collector registered in it.
pub struct Metrics {
    pub registry: Registry,
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub upload_requests_total: IntCounterVec,
    pub genai_provider_latency_seconds: HistogramVec,
    pub genai_provider_errors_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

impl Metrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "path", "status"],
        )?;

        // outcome: preflight, success, no_file, payload_too_large, bad_gateway, internal_error
        let upload_requests_total = IntCounterVec::new(
            Opts::new("upload_requests_total", "Upload requests by outcome"),
            &["outcome"],
        )?;

        let genai_provider_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "genai_provider_latency_seconds",
                "AI provider API latency in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
            &["provider", "model"],
        )?;

        let genai_provider_errors_total = IntCounterVec::new(
            Opts::new("genai_provider_errors_total", "Total AI provider errors"),
            &["provider", "error_type"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(upload_requests_total.clone()))?;
        registry.register(Box::new(genai_provider_latency_seconds.clone()))?;
        registry.register(Box::new(genai_provider_errors_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            upload_requests_total,
            genai_provider_latency_seconds,
            genai_provider_errors_total,
        })
    }
}

/// Initialize all metrics. Later calls are no-ops.
///
/// Racing first calls may each build a set of collectors, but only one set is
/// ever published, so recorders and the exporter always share a registry.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let metrics = Metrics::new()?;
    if METRICS.set(metrics).is_ok() {
        tracing::info!("Prometheus metrics initialized");
    }
    Ok(())
}

/// The published metrics, if `init_metrics` has run.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match METRICS.get() {
        Some(m) => &m.registry,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.http_requests_total
            .with_label_values(&[method, path, status])
            .inc();
        m.http_request_duration_seconds
            .with_label_values(&[method, path, status])
            .observe(duration_secs);
    }
}

/// Record how an upload request ended.
pub fn record_upload(outcome: &str) {
    if let Some(m) = METRICS.get() {
        m.upload_requests_total.with_label_values(&[outcome]).inc();
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.genai_provider_latency_seconds
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(m) = METRICS.get() {
        m.genai_provider_errors_total
            .with_label_values(&[provider, error_type])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_init_publishes_one_registry() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(init_metrics))
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let published = metrics().expect("metrics published");
        record_provider_error("mock", "rate_limited");

        let count = published
            .genai_provider_errors_total
            .with_label_values(&["mock", "rate_limited"])
            .get();
        assert!(count >= 1);
        assert!(get_metrics().contains("genai_provider_errors_total"));
    }
}
