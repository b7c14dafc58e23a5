//! # X-Attest Node
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `XA_*` environment variables
//! 2. Initialize logging and the metrics registry
//! 3. Build subsystems (network file, index, aggregator, provider)
//! 4. Start streams, pipeline and monitor
//! 5. Run until Ctrl+C, then shut down gracefully

use anyhow::{Context, Result};
use tracing::info;

use node_runtime::{load_config, NodeRuntime, SubsystemContainer};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("Invalid configuration")?;
    let metrics =
        xa_telemetry::init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  X-Attest Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let container =
        SubsystemContainer::new(config, metrics).context("Failed to initialize subsystems")?;
    let runtime = NodeRuntime::start(container).context("Failed to start streams")?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;

    Ok(())
}
