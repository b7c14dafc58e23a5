//! # Subsystem Container
//!
//! Node configuration and the container that builds every subsystem from
//! it.

pub mod config;
pub mod subsystems;

pub use config::{load_config, load_config_from, ConfigError, NodeConfig};
pub use subsystems::{
    ContainerError, NodeAggregator, NodeIndexer, NodeReader, SubsystemContainer,
};
