//! Prometheus metrics for search and embedding operations.

use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Search metrics
    // ============================================================================

    /// Total number of search requests
    pub static ref SEARCH_REQUESTS: Counter = Counter::with_opts(
        Opts::new(
            "heritage_lens_search_requests_total",
            "Total number of search requests"
        )
    ).expect("Failed to create SEARCH_REQUESTS counter");

    /// Total number of failed search requests
    pub static ref SEARCH_FAILURES: Counter = Counter::with_opts(
        Opts::new(
            "heritage_lens_search_failures_total",
            "Total number of failed search requests"
        )
    ).expect("Failed to create SEARCH_FAILURES counter");

    /// Search request latency in seconds
    pub static ref SEARCH_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "heritage_lens_search_latency_seconds",
            "Search request latency in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0])
    ).expect("Failed to create SEARCH_LATENCY histogram");

    /// Number of search results returned per request
    pub static ref SEARCH_RESULTS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "heritage_lens_search_results_count",
            "Number of search results returned per request"
        ).buckets(vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0])
    ).expect("Failed to create SEARCH_RESULTS histogram");

    // ============================================================================
    // Store metrics
    // ============================================================================

    /// Total number of artifacts in the keyword index
    pub static ref STORED_ARTIFACTS: Gauge = Gauge::with_opts(
        Opts::new(
            "heritage_lens_artifacts_total",
            "Total number of stored artifacts"
        )
    ).expect("Failed to create STORED_ARTIFACTS gauge");

    /// Number of artifacts that carry an embedding
    pub static ref EMBEDDED_ARTIFACTS: Gauge = Gauge::with_opts(
        Opts::new(
            "heritage_lens_embedded_artifacts_total",
            "Number of artifacts with an embedding"
        )
    ).expect("Failed to create EMBEDDED_ARTIFACTS gauge");

    // ============================================================================
    // Embedding metrics
    // ============================================================================

    /// Total embedding generation requests
    pub static ref EMBEDDING_REQUESTS: Counter = Counter::with_opts(
        Opts::new(
            "heritage_lens_embedding_requests_total",
            "Total embedding generation requests"
        )
    ).expect("Failed to create EMBEDDING_REQUESTS counter");

    /// Embedding generation latency in seconds
    pub static ref EMBEDDING_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "heritage_lens_embedding_latency_seconds",
            "Embedding generation latency in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0])
    ).expect("Failed to create EMBEDDING_LATENCY histogram");
}

/// Register all metrics with the global registry
///
/// Call once at startup. Registering twice is logged and otherwise ignored.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SEARCH_REQUESTS.clone()),
        Box::new(SEARCH_FAILURES.clone()),
        Box::new(SEARCH_LATENCY.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(STORED_ARTIFACTS.clone()),
        Box::new(EMBEDDED_ARTIFACTS.clone()),
        Box::new(EMBEDDING_REQUESTS.clone()),
        Box::new(EMBEDDING_LATENCY.clone()),
    ];

    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            tracing::warn!("Failed to register metric: {}", e);
        }
    }
}

/// Gather all metrics and encode them in Prometheus text format
///
/// Returns an empty string if encoding fails.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Metrics contained invalid UTF-8: {}", e);
        String::new()
    })
}

/// Current metric values in a human-readable form, for the stats command.
pub struct MetricSnapshot {
    pub search_requests_total: f64,
    pub search_failures_total: f64,
    pub search_latency_avg: f64,
    pub search_results_avg: f64,
    pub stored_artifacts: f64,
    pub embedded_artifacts: f64,
    pub embedding_requests_total: f64,
    pub embedding_latency_avg: f64,
}

impl MetricSnapshot {
    /// Capture the current state of all metrics
    pub fn capture() -> Self {
        Self {
            search_requests_total: SEARCH_REQUESTS.get(),
            search_failures_total: SEARCH_FAILURES.get(),
            search_latency_avg: calculate_histogram_avg(&SEARCH_LATENCY),
            search_results_avg: calculate_histogram_avg(&SEARCH_RESULTS),
            stored_artifacts: STORED_ARTIFACTS.get(),
            embedded_artifacts: EMBEDDED_ARTIFACTS.get(),
            embedding_requests_total: EMBEDDING_REQUESTS.get(),
            embedding_latency_avg: calculate_histogram_avg(&EMBEDDING_LATENCY),
        }
    }
}

fn calculate_histogram_avg(histogram: &Histogram) -> f64 {
    let count = histogram.get_sample_count();
    if count == 0 {
        return 0.0;
    }
    histogram.get_sample_sum() / count as f64
}
