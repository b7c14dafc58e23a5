//! # Handlers
//!
//! Long-running tasks of the node.
//!
//! - `pipeline` - applies the vote log and indexes attestations
//! - `monitor` - periodic cursor report and metrics export

pub mod monitor;
pub mod pipeline;

pub use monitor::CursorMonitor;
pub use pipeline::{AttestationPipeline, PipelineError};
