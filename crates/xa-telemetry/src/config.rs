//! Telemetry configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Logging and metrics settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or full directive
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Prometheus text file rewritten by the node's monitor task
    pub metrics_file: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "xattest".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_file: None,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `XA_SERVICE_NAME`: Service name (default: xattest)
    /// - `XA_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `XA_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `XA_METRICS_FILE`: Path of the Prometheus text file (default: unset)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("XA_SERVICE_NAME").unwrap_or_else(|| "xattest".to_string()),

            log_level: lookup("XA_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            json_logs: lookup("XA_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_file: lookup("XA_METRICS_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}
