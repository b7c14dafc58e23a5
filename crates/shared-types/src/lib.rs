//! # Shared Types Crate
//!
//! Chain primitives, block content and network configuration shared by every
//! X-Attest crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Content Addressed**: A `Block` hash commits to its chain, height and
//!   payload, so validators that fetched the same content vote the same hash.
//! - **Deterministic Order**: Identity types implement `Ord` so replicated
//!   state can live in ordered maps.

pub mod entities;
pub mod errors;
pub mod network;

pub use entities::*;
pub use errors::*;
pub use network::*;
