//! # XProvider Metrics
//!
//! Prometheus implementation of the per-chain stream metric handles.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! xa-01-xprovider = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `xa_xprovider_fetch_errors_total{chain}` - Failed fetch or verify attempts
//! - `xa_xprovider_callback_errors_total{chain}` - Failed deliveries in retrying mode
//! - `xa_xprovider_stream_height{chain}` - Last delivered height

use crate::ports::outbound::{StreamMetrics, StreamMetricsFactory};
use prometheus::{IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use std::sync::Arc;

/// Metric vectors registered on a caller-owned registry.
#[derive(Clone)]
pub struct PrometheusStreamMetrics {
    fetch_errors: IntCounterVec,
    callback_errors: IntCounterVec,
    stream_height: IntGaugeVec,
}

impl PrometheusStreamMetrics {
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let fetch_errors = IntCounterVec::new(
            Opts::new(
                "xa_xprovider_fetch_errors_total",
                "Total number of failed block fetch or verify attempts",
            ),
            &["chain"],
        )?;
        let callback_errors = IntCounterVec::new(
            Opts::new(
                "xa_xprovider_callback_errors_total",
                "Total number of failed block deliveries",
            ),
            &["chain"],
        )?;
        let stream_height = IntGaugeVec::new(
            Opts::new(
                "xa_xprovider_stream_height",
                "Height of the last delivered block",
            ),
            &["chain"],
        )?;

        registry.register(Box::new(fetch_errors.clone()))?;
        registry.register(Box::new(callback_errors.clone()))?;
        registry.register(Box::new(stream_height.clone()))?;

        Ok(Self {
            fetch_errors,
            callback_errors,
            stream_height,
        })
    }
}

impl StreamMetricsFactory for PrometheusStreamMetrics {
    fn for_chain(&self, chain_name: &str) -> Arc<dyn StreamMetrics> {
        Arc::new(ChainStreamMetrics {
            fetch_errors: self.fetch_errors.with_label_values(&[chain_name]),
            callback_errors: self.callback_errors.with_label_values(&[chain_name]),
            stream_height: self.stream_height.with_label_values(&[chain_name]),
        })
    }
}

/// Handles bound to one chain label.
struct ChainStreamMetrics {
    fetch_errors: IntCounter,
    callback_errors: IntCounter,
    stream_height: IntGauge,
}

impl StreamMetrics for ChainStreamMetrics {
    fn inc_fetch_err(&self) {
        self.fetch_errors.inc();
    }

    fn inc_callback_err(&self) {
        self.callback_errors.inc();
    }

    fn set_stream_height(&self, height: u64) {
        self.stream_height
            .set(i64::try_from(height).unwrap_or(i64::MAX));
    }
}
