//! Prometheus registry owned by the node.
//!
//! Subsystem crates register their metric vectors on this registry through
//! their own `metrics` feature. Naming convention:
//! `xa_<subsystem>_<metric>[_total]`.

use crate::TelemetryError;
use prometheus::{Encoder, Registry, TextEncoder};
use std::path::Path;

/// Process-wide registry handle, passed explicitly to each subsystem.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    registry: Registry,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition format of every registered metric.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }

    /// Atomically replace `path` with the current exposition text.
    pub fn write_textfile(&self, path: &Path) -> Result<(), TelemetryError> {
        let text = self.encode()?;
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, text).map_err(|e| TelemetryError::Export(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| TelemetryError::Export(e.to_string()))
    }
}
