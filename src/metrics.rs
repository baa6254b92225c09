//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tavern_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "tavern_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Protocol Metrics
    pub static ref MEDIA_TYPE_REJECTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tavern_media_type_rejections_total", "Requests rejected by content negotiation"),
        &["method"]
    ).expect("metric can be created");
    pub static ref WEBFINGER_LOOKUPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tavern_webfinger_lookups_total", "Total number of webfinger lookups"),
        &["result"]
    ).expect("metric can be created");
    pub static ref COLLECTION_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tavern_collection_requests_total", "Total number of collection documents rendered"),
        &["collection", "document"]
    ).expect("metric can be created");
    pub static ref OUTBOX_SUBMISSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tavern_outbox_submissions_total", "Total number of outbox submissions"),
        &["result"]
    ).expect("metric can be created");

    // Application Metrics
    pub static ref ACTORS_TOTAL: IntGauge = IntGauge::new(
        "tavern_actors_total",
        "Number of actors provisioned at startup"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tavern_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Publish the hosted actor count
pub fn set_actors_total(total: u64) {
    ACTORS_TOTAL.set(gauge_value(total));
}

/// Gauges are signed; counts past `i64::MAX` saturate
fn gauge_value(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Initialize metrics registry.
///
/// Registration happens once per process; later calls are no-ops.
pub fn init_metrics() {
    INIT.call_once(register_all);
}

fn register_all() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(MEDIA_TYPE_REJECTIONS_TOTAL.clone()))
        .expect("MEDIA_TYPE_REJECTIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(WEBFINGER_LOOKUPS_TOTAL.clone()))
        .expect("WEBFINGER_LOOKUPS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(COLLECTION_REQUESTS_TOTAL.clone()))
        .expect("COLLECTION_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(OUTBOX_SUBMISSIONS_TOTAL.clone()))
        .expect("OUTBOX_SUBMISSIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ACTORS_TOTAL.clone()))
        .expect("ACTORS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
