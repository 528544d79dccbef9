//! Telemetry and observability utilities

use std::sync::Arc;

#[cfg(feature = "metrics")]
use opentelemetry::{
    metrics::{Counter, Histogram},
    KeyValue,
};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Whether telemetry is enabled
    pub enabled: bool,
    /// Service name for metrics
    pub service_name: String,
    /// Service version for metrics
    pub service_version: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: "password-safe-sdk".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// SDK metrics collector
///
/// Every recording method is a no-op when the `metrics` feature is off.
#[derive(Clone)]
pub struct Metrics {
    #[cfg(feature = "metrics")]
    pub(crate) requests_total: Counter<u64>,

    #[cfg(feature = "metrics")]
    pub(crate) request_duration: Histogram<f64>,

    #[cfg(feature = "metrics")]
    pub(crate) errors_total: Counter<u64>,

    #[cfg(feature = "metrics")]
    pub(crate) token_refreshes: Counter<u64>,

    #[cfg(feature = "metrics")]
    pub(crate) conflict_adoptions: Counter<u64>,
}

impl Metrics {
    /// Create new metrics instance
    #[cfg(feature = "metrics")]
    pub fn new(config: &TelemetryConfig) -> Self {
        use opentelemetry::global;

        let meter = global::meter(config.service_name.clone());

        let requests_total = meter
            .u64_counter("password_safe_sdk.requests_total")
            .with_description("Total number of requests made")
            .init();

        let request_duration = meter
            .f64_histogram("password_safe_sdk.request_duration_seconds")
            .with_description("Request duration in seconds")
            .init();

        let errors_total = meter
            .u64_counter("password_safe_sdk.errors_total")
            .with_description("Total number of failed requests")
            .init();

        let token_refreshes = meter
            .u64_counter("password_safe_sdk.token_refreshes_total")
            .with_description("Total number of session re-authentications")
            .init();

        let conflict_adoptions = meter
            .u64_counter("password_safe_sdk.conflict_adoptions_total")
            .with_description("Password requests answered by reusing an active request")
            .init();

        Self {
            requests_total,
            request_duration,
            errors_total,
            token_refreshes,
            conflict_adoptions,
        }
    }

    /// Create a no-op metrics instance when feature is disabled
    #[cfg(not(feature = "metrics"))]
    pub fn new(_config: &TelemetryConfig) -> Self {
        Self {}
    }

    /// Record a completed HTTP exchange
    #[cfg(feature = "metrics")]
    pub fn record_request(&self, operation: &str, status: u16, duration_secs: f64) {
        let labels = &[
            KeyValue::new("operation", operation.to_string()),
            KeyValue::new("status", status.to_string()),
        ];

        self.requests_total.add(1, labels);
        self.request_duration.record(duration_secs, labels);

        if status >= 400 {
            self.errors_total.add(
                1,
                &[
                    KeyValue::new("operation", operation.to_string()),
                    KeyValue::new("type", if status >= 500 { "server" } else { "client" }),
                    KeyValue::new("status", status.to_string()),
                ],
            );
        }
    }

    /// Record a completed HTTP exchange (no-op when metrics disabled)
    #[cfg(not(feature = "metrics"))]
    pub fn record_request(&self, _operation: &str, _status: u16, _duration_secs: f64) {}

    /// Record a request that never got a response
    #[cfg(feature = "metrics")]
    pub fn record_transport_error(&self, operation: &str) {
        self.errors_total.add(
            1,
            &[
                KeyValue::new("operation", operation.to_string()),
                KeyValue::new("type", "network"),
            ],
        );
    }

    /// Record a request that never got a response (no-op)
    #[cfg(not(feature = "metrics"))]
    pub fn record_transport_error(&self, _operation: &str) {}

    /// Record a session re-authentication
    #[cfg(feature = "metrics")]
    pub fn record_token_refresh(&self, reason: &str) {
        self.token_refreshes
            .add(1, &[KeyValue::new("reason", reason.to_string())]);
    }

    /// Record a session re-authentication (no-op)
    #[cfg(not(feature = "metrics"))]
    pub fn record_token_refresh(&self, _reason: &str) {}

    /// Record a 409 answered by adopting an active request
    #[cfg(feature = "metrics")]
    pub fn record_conflict_adoption(&self) {
        self.conflict_adoptions.add(1, &[]);
    }

    /// Record a 409 answered by adopting an active request (no-op)
    #[cfg(not(feature = "metrics"))]
    pub fn record_conflict_adoption(&self) {}
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("enabled", &cfg!(feature = "metrics"))
            .finish()
    }
}

/// Global telemetry instance holder
static TELEMETRY: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Initialize global telemetry
pub fn init_telemetry(config: TelemetryConfig) -> Arc<Metrics> {
    TELEMETRY
        .get_or_init(|| Arc::new(Metrics::new(&config)))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.service_name, "password-safe-sdk");
    }

    #[test]
    fn test_metrics_recording_does_not_panic() {
        let config = TelemetryConfig {
            enabled: true,
            ..Default::default()
        };

        let metrics = Metrics::new(&config);
        metrics.record_request("get_managed_systems", 200, 0.01);
        metrics.record_request("create_password_request", 409, 0.02);
        metrics.record_transport_error("sign_in");
        metrics.record_token_refresh("unauthorized");
        metrics.record_conflict_adoption();
    }

    #[test]
    fn test_init_telemetry_is_shared() {
        let first = init_telemetry(TelemetryConfig::default());
        let second = init_telemetry(TelemetryConfig::default());
        assert!(Arc::ptr_eq(&first, &second));
        assert!(TELEMETRY.get().is_some());
    }
}
