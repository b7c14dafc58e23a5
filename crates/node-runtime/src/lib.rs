//! # Node Runtime Library
//!
//! The X-Attest validator node, exposed as a library for testing. The main
//! entry point is the `main.rs` binary.
//!
//! ## Modules
//!
//! - `container/` - configuration and subsystem construction
//! - `adapters/` - file fetcher, block cache, vote log, index storage
//! - `handlers/` - attestation pipeline and cursor monitor
//! - `runtime` - task lifecycle
//!
//! ## Flow
//!
//! ```text
//! <blocks_dir>/<chain>/<height>.json
//!          │
//!          ↓
//!   XProvider (xa-01, one stream per chain)
//!          │ verified Block
//!          ↓
//!   VotingCallback ── cache block, sign vote ──→ vote log
//!                                                  │
//!                                                  ↓
//!                                Aggregator (xa-02) ── Attestation ──→ Indexer (xa-03)
//!                                                                          │
//!                                                             CursorMonitor (logs, metrics)
//! ```
//!
//! ## Restart
//!
//! Each chain resumes at one above its indexed cursor for the chain's
//! confidence level, or at its deploy height on a fresh index.

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod runtime;

pub use container::{load_config, ConfigError, ContainerError, NodeConfig, SubsystemContainer};
pub use runtime::NodeRuntime;
