use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all predictor metrics
const PREFIX: &str = "viewcount";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Prediction Metrics
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_predictions_total"), "Prediction requests by outcome"),
        &["outcome"]
    ).expect("Failed to create predictions_total metric");

    pub static ref PREDICTED_VIEW_COUNT: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_predicted_view_count"),
            "Distribution of predicted view counts"
        )
        .buckets(prometheus::exponential_buckets(100.0, 10.0, 8).unwrap_or_default())
    ).expect("Failed to create predicted_view_count metric");

    // Model Loading Metrics
    pub static ref MODEL_LOADS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_model_loads_total"), "Model load attempts by outcome"),
        &["outcome"]
    ).expect("Failed to create model_loads_total metric");

    pub static ref MODEL_LOAD_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_model_load_duration_seconds"),
            "Time spent fetching and decoding the model"
        )
        .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0])
    ).expect("Failed to create model_load_duration_seconds metric");

    pub static ref MODEL_LOADED: IntGauge = IntGauge::new(
        format!("{PREFIX}_model_loaded"),
        "1 once a model is held in memory"
    ).expect("Failed to create model_loaded metric");
}

/// Initialize all metrics and register them with the global registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(PREDICTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PREDICTED_VIEW_COUNT.clone()));
    let _ = REGISTRY.register(Box::new(MODEL_LOADS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(MODEL_LOAD_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(MODEL_LOADED.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Outcome is "success" or the failure kind.
pub fn record_prediction(outcome: &str, predicted: Option<f64>) {
    PREDICTIONS_TOTAL.with_label_values(&[outcome]).inc();
    if let Some(value) = predicted {
        PREDICTED_VIEW_COUNT.observe(value);
    }
}

pub fn record_model_load(outcome: &str, duration: Duration) {
    MODEL_LOADS_TOTAL.with_label_values(&[outcome]).inc();
    MODEL_LOAD_DURATION_SECONDS.observe(duration.as_secs_f64());
    if outcome == "success" {
        MODEL_LOADED.set(1);
    }
}

/// Collapses unknown paths so scanners cannot blow up label cardinality.
pub fn normalize_path(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/predict" => "/predict",
        "/invoke" => "/invoke",
        "/features" => "/features",
        _ => "other",
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
