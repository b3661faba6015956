//! Prometheus metrics for chat-service.
//!
//! Recording helpers are no-ops until `init_metrics` has run, so library
//! code and unit tests can call them freely.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Chat flow metrics
pub static CHAT_MESSAGES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static CHAT_ACTIVE_SESSIONS: OnceLock<IntGauge> = OnceLock::new();
pub static CONTACT_SUBMISSIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Model provider metrics
pub static MODEL_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static MODEL_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Notification bus metrics
pub static BUS_CONSUMER_FAILURES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Database metrics
pub static DB_OPERATION_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static DB_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

static INIT: Once = Once::new();

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let chat_messages = IntCounterVec::new(
        Opts::new("chat_messages_total", "Total chat messages handled"),
        &["outcome"], // outcome: answered, failed
    )
    .expect("Failed to create chat_messages_total metric");

    let active_sessions = IntGauge::new(
        "chat_active_sessions",
        "Number of live model sessions",
    )
    .expect("Failed to create chat_active_sessions metric");

    let contact_submissions = IntCounterVec::new(
        Opts::new("contact_submissions_total", "Total contact form submissions"),
        &["subject"],
    )
    .expect("Failed to create contact_submissions_total metric");

    let model_latency = HistogramVec::new(
        HistogramOpts::new(
            "chat_model_latency_seconds",
            "Remote model call latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["provider", "model"],
    )
    .expect("Failed to create chat_model_latency_seconds metric");

    let model_errors = IntCounterVec::new(
        Opts::new("chat_model_errors_total", "Total remote model errors"),
        &["provider", "error_type"],
    )
    .expect("Failed to create chat_model_errors_total metric");

    let consumer_failures = IntCounterVec::new(
        Opts::new(
            "bus_consumer_failures_total",
            "Total event consumer failures, including panics",
        ),
        &["consumer"],
    )
    .expect("Failed to create bus_consumer_failures_total metric");

    let db_duration = HistogramVec::new(
        HistogramOpts::new(
            "db_operation_duration_seconds",
            "Database operation duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["operation", "collection"],
    )
    .expect("Failed to create db_operation_duration_seconds metric");

    let db_errors = IntCounterVec::new(
        Opts::new("db_errors_total", "Total database errors"),
        &["operation", "collection"],
    )
    .expect("Failed to create db_errors_total metric");

    registry
        .register(Box::new(chat_messages.clone()))
        .expect("Failed to register chat_messages_total");
    registry
        .register(Box::new(active_sessions.clone()))
        .expect("Failed to register chat_active_sessions");
    registry
        .register(Box::new(contact_submissions.clone()))
        .expect("Failed to register contact_submissions_total");
    registry
        .register(Box::new(model_latency.clone()))
        .expect("Failed to register chat_model_latency_seconds");
    registry
        .register(Box::new(model_errors.clone()))
        .expect("Failed to register chat_model_errors_total");
    registry
        .register(Box::new(consumer_failures.clone()))
        .expect("Failed to register bus_consumer_failures_total");
    registry
        .register(Box::new(db_duration.clone()))
        .expect("Failed to register db_operation_duration_seconds");
    registry
        .register(Box::new(db_errors.clone()))
        .expect("Failed to register db_errors_total");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = CHAT_MESSAGES_TOTAL.set(chat_messages);
    let _ = CHAT_ACTIVE_SESSIONS.set(active_sessions);
    let _ = CONTACT_SUBMISSIONS_TOTAL.set(contact_submissions);
    let _ = MODEL_LATENCY_SECONDS.set(model_latency);
    let _ = MODEL_ERRORS_TOTAL.set(model_errors);
    let _ = BUS_CONSUMER_FAILURES_TOTAL.set(consumer_failures);
    let _ = DB_OPERATION_DURATION_SECONDS.set(db_duration);
    let _ = DB_ERRORS_TOTAL.set(db_errors);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
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

/// Record a handled chat message.
pub fn record_chat_message(outcome: &str) {
    if let Some(counter) = CHAT_MESSAGES_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn set_active_sessions(count: usize) {
    if let Some(gauge) = CHAT_ACTIVE_SESSIONS.get() {
        gauge.set(count as i64);
    }
}

pub fn record_contact_submission(subject: &str) {
    if let Some(counter) = CONTACT_SUBMISSIONS_TOTAL.get() {
        counter.with_label_values(&[subject]).inc();
    }
}

/// Record remote model latency.
pub fn record_model_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = MODEL_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a remote model error.
pub fn record_model_error(provider: &str, error_type: &str) {
    if let Some(counter) = MODEL_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

/// Record an event consumer that failed or panicked.
pub fn record_consumer_failure(consumer: &str) {
    if let Some(counter) = BUS_CONSUMER_FAILURES_TOTAL.get() {
        counter.with_label_values(&[consumer]).inc();
    }
}

/// Record database operation duration.
pub fn record_db_operation(operation: &str, collection: &str, duration_secs: f64) {
    if let Some(histogram) = DB_OPERATION_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[operation, collection])
            .observe(duration_secs);
    }
}

/// Record a database error.
pub fn record_db_error(operation: &str, collection: &str) {
    if let Some(counter) = DB_ERRORS_TOTAL.get() {
        counter.with_label_values(&[operation, collection]).inc();
    }
}
