//! Prometheus metrics for the incident tracker.
//!
//! Everything lives in one global registry under the `incident_tracker`
//! namespace and is rendered in text format by `GET /metrics`.
//!
//! # Example
//! ```no_run
//! use incident_tracker::metrics::INCIDENTS_CREATED_TOTAL;
//!
//! INCIDENTS_CREATED_TOTAL
//!     .with_label_values(&["monitoring"])
//!     .inc();
//! ```

pub mod middleware;

pub use middleware::track_metrics;

use lazy_static::lazy_static;
use prometheus::{CounterVec, GaugeVec, Opts, Registry};

const NAMESPACE: &str = "incident_tracker";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    // ============================================================================
    // Incident Lifecycle Metrics
    // ============================================================================

    /// Total number of incidents created
    ///
    /// Labels: source
    pub static ref INCIDENTS_CREATED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("incidents_created_total", "Total number of incidents created")
            .namespace(NAMESPACE),
        &["source"]
    ).expect("Failed to create INCIDENTS_CREATED_TOTAL metric");

    /// Requested status transitions
    ///
    /// Labels: from, to, outcome (applied, rejected)
    pub static ref STATUS_TRANSITIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("status_transitions_total", "Total number of requested status transitions")
            .namespace(NAMESPACE),
        &["from", "to", "outcome"]
    ).expect("Failed to create STATUS_TRANSITIONS_TOTAL metric");

    // ============================================================================
    // Storage Metrics
    // ============================================================================

    /// Finished units of work
    ///
    /// Labels: backend, outcome (commit, rollback, commit_failed, rollback_failed)
    pub static ref UNIT_OF_WORK_TOTAL: CounterVec = CounterVec::new(
        Opts::new("unit_of_work_total", "Total number of finished units of work")
            .namespace(NAMESPACE),
        &["backend", "outcome"]
    ).expect("Failed to create UNIT_OF_WORK_TOTAL metric");

    // ============================================================================
    // Error Metrics
    // ============================================================================

    /// Total number of error responses
    ///
    /// Labels: error_code
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("errors_total", "Total number of errors")
            .namespace(NAMESPACE),
        &["error_code"]
    ).expect("Failed to create ERRORS_TOTAL metric");

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Application build info
    ///
    /// Labels: version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Application build information")
            .namespace(NAMESPACE),
        &["version"]
    ).expect("Failed to create BUILD_INFO metric");
}

/// Initialize the Prometheus metrics registry
///
/// Registers every metric with [`PROMETHEUS_REGISTRY`]. Call once at startup;
/// a second call fails with `AlreadyReg`.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(INCIDENTS_CREATED_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(STATUS_TRANSITIONS_TOTAL.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(UNIT_OF_WORK_TOTAL.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(ERRORS_TOTAL.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(BUILD_INFO.clone()))?;

    BUILD_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1.0);

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Generate Prometheus text format metrics for the /metrics endpoint
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        // Global registry: another test may already have registered everything
        let _ = init_metrics();
        let output = gather_metrics();
        assert!(output.contains("incident_tracker_build_info"));
    }

    #[test]
    fn test_transition_counter() {
        let counter = STATUS_TRANSITIONS_TOTAL.with_label_values(&["open", "resolved", "applied"]);
        let before = counter.get();
        counter.inc();
        assert_eq!(counter.get(), before + 1.0);
    }
}
