//! # XA Telemetry
//!
//! Logging and metrics plumbing for the attestation node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xa_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let metrics = init_telemetry(&config)?;
//! // pass metrics.registry() to each subsystem's `metrics` module
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XA_SERVICE_NAME` | `xattest` | Service name in logs |
//! | `XA_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `XA_JSON_LOGS` | `false` (`true` in containers) | JSON log output |
//! | `XA_METRICS_FILE` | unset | Prometheus text file path |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::MetricsRegistry;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Failed to export metrics: {0}")]
    Export(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and create the metrics registry.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<MetricsRegistry, TelemetryError> {
    init_logging(config)?;
    Ok(MetricsRegistry::new())
}
