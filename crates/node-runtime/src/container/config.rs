//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! Every section has a `Default`; [`load_config`] overrides it from `XA_*`
//! environment variables and [`NodeConfig::validate`] rejects anything the
//! node cannot run with.
//!
//! | Variable | Section | Default |
//! |---|---|---|
//! | `XA_NETWORK_FILE` | network file | `./network.json` |
//! | `XA_BLOCKS_DIR` | block source root | `./blocks` |
//! | `XA_VALIDATOR_SEED` | local ed25519 seed (64 hex chars) | required |
//! | `XA_WINDOW_SIZE` | attest | `64` |
//! | `XA_QUORUM` | attest | `2/3` |
//! | `XA_MAX_VOTES_PER_BATCH` | attest | `1024` |
//! | `XA_BACKOFF` | stream (`fast` or `slow`) | `fast` |
//! | `XA_VOTE_LOG_CAPACITY` | stream | `1024` |
//! | `XA_BLOCK_CACHE` | stream | `1024` |
//! | `XA_STORAGE` | storage (`memory` or `rocksdb`) | `memory` |
//! | `XA_DATA_DIR` | storage | `./data` |
//! | `XA_MONITOR_INTERVAL_SECS` | monitor | `30` |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use xa_01_xprovider::BackoffConfig;
use xa_02_attestation::{AggregatorConfig, QuorumThreshold};
use xa_telemetry::TelemetryConfig;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// JSON network description shared by every validator.
    pub network_file: PathBuf,
    /// Root of the file-backed block source.
    pub blocks_dir: PathBuf,
    /// Seed of the local validator's signing key.
    pub validator_seed: Option<[u8; 32]>,
    pub attest: AttestConfig,
    pub stream: StreamConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
    pub monitor: MonitorConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network_file: PathBuf::from("./network.json"),
            blocks_dir: PathBuf::from("./blocks"),
            validator_seed: None,
            attest: AttestConfig::default(),
            stream: StreamConfig::default(),
            storage: StorageConfig::default(),
            telemetry: TelemetryConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Validate configuration before any subsystem is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validator_seed.is_none() {
            return Err(ConfigError::MissingValidatorSeed);
        }
        self.attest.aggregator()?;
        self.stream
            .backoff
            .validate()
            .map_err(|reason| ConfigError::invalid("XA_BACKOFF", "", reason))?;
        if self.stream.vote_log_capacity == 0 {
            return Err(ConfigError::invalid(
                "XA_VOTE_LOG_CAPACITY",
                "0",
                "must be positive",
            ));
        }
        if self.monitor.interval.is_zero() {
            return Err(ConfigError::invalid(
                "XA_MONITOR_INTERVAL_SECS",
                "0",
                "must be positive",
            ));
        }
        if self.storage.backend == StorageBackend::RocksDb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::BackendUnavailable("rocksdb"));
        }
        Ok(())
    }
}

/// Configuration errors. Always fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Validator seed not set. Set XA_VALIDATOR_SEED to 64 hex characters.")]
    MissingValidatorSeed,

    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// Backend selected but not compiled in.
    #[error("Storage backend {0} requires the `{0}` feature")]
    BackendUnavailable(&'static str),
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Aggregator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttestConfig {
    /// Heights above the watermark accepting votes.
    pub window_size: u64,
    pub quorum: QuorumThreshold,
    pub max_votes_per_batch: usize,
}

impl Default for AttestConfig {
    fn default() -> Self {
        let defaults = AggregatorConfig::default();
        Self {
            window_size: defaults.window_size,
            quorum: defaults.quorum,
            max_votes_per_batch: defaults.max_votes_per_batch,
        }
    }
}

impl AttestConfig {
    pub fn aggregator(&self) -> Result<AggregatorConfig, ConfigError> {
        let config = AggregatorConfig {
            window_size: self.window_size,
            quorum: self.quorum,
            max_votes_per_batch: self.max_votes_per_batch,
        };
        config.validate().map_err(|e| ConfigError::InvalidValue {
            var: "XA_WINDOW_SIZE/XA_QUORUM/XA_MAX_VOTES_PER_BATCH",
            value: format!(
                "{}, {}/{}, {}",
                self.window_size,
                self.quorum.numerator,
                self.quorum.denominator,
                self.max_votes_per_batch
            ),
            reason: e.to_string(),
        })?;
        Ok(config)
    }
}

/// Block streaming and vote log parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConfig {
    pub backoff: BackoffConfig,
    /// Votes buffered between the streams and the pipeline.
    pub vote_log_capacity: usize,
    /// Fetched blocks kept for indexing once attested.
    pub block_cache_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffConfig::fast(),
            vote_log_capacity: 1024,
            block_cache_capacity: 1024,
        }
    }
}

/// Index storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    RocksDb,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Data directory for persistent backends.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Cursor monitor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Load configuration from environment variables.
pub fn load_config() -> Result<NodeConfig, ConfigError> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Same as [`load_config`] over an arbitrary variable source.
pub fn load_config_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<NodeConfig, ConfigError> {
    let mut config = NodeConfig {
        telemetry: TelemetryConfig::from_lookup(&lookup),
        ..NodeConfig::default()
    };

    if let Some(path) = lookup("XA_NETWORK_FILE") {
        config.network_file = PathBuf::from(path);
    }
    if let Some(path) = lookup("XA_BLOCKS_DIR") {
        config.blocks_dir = PathBuf::from(path);
    }
    if let Some(seed) = lookup("XA_VALIDATOR_SEED") {
        config.validator_seed = Some(parse_seed(&seed)?);
    }

    if let Some(value) = lookup("XA_WINDOW_SIZE") {
        config.attest.window_size = parse_number("XA_WINDOW_SIZE", &value)?;
    }
    if let Some(value) = lookup("XA_QUORUM") {
        config.attest.quorum = parse_quorum(&value)?;
    }
    if let Some(value) = lookup("XA_MAX_VOTES_PER_BATCH") {
        config.attest.max_votes_per_batch = parse_number("XA_MAX_VOTES_PER_BATCH", &value)?;
    }

    if let Some(value) = lookup("XA_BACKOFF") {
        config.stream.backoff = match value.as_str() {
            "fast" => BackoffConfig::fast(),
            "slow" => BackoffConfig::slow(),
            _ => return Err(ConfigError::invalid("XA_BACKOFF", &value, "expected fast or slow")),
        };
    }
    if let Some(value) = lookup("XA_VOTE_LOG_CAPACITY") {
        config.stream.vote_log_capacity = parse_number("XA_VOTE_LOG_CAPACITY", &value)?;
    }
    if let Some(value) = lookup("XA_BLOCK_CACHE") {
        config.stream.block_cache_capacity = parse_number("XA_BLOCK_CACHE", &value)?;
    }

    if let Some(value) = lookup("XA_STORAGE") {
        config.storage.backend = match value.as_str() {
            "memory" => StorageBackend::Memory,
            "rocksdb" => StorageBackend::RocksDb,
            _ => {
                return Err(ConfigError::invalid(
                    "XA_STORAGE",
                    &value,
                    "expected memory or rocksdb",
                ))
            }
        };
    }
    if let Some(path) = lookup("XA_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(path);
    }

    if let Some(value) = lookup("XA_MONITOR_INTERVAL_SECS") {
        config.monitor.interval =
            Duration::from_secs(parse_number("XA_MONITOR_INTERVAL_SECS", &value)?);
    }

    Ok(config)
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(var, value, e))
}

fn parse_seed(value: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = hex::decode(value.trim().trim_start_matches("0x"))
        .map_err(|e| ConfigError::invalid("XA_VALIDATOR_SEED", "<redacted>", e))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        ConfigError::invalid(
            "XA_VALIDATOR_SEED",
            "<redacted>",
            "must be 32 bytes (64 hex chars)",
        )
    })
}

/// `"n/d"`, e.g. `2/3`.
fn parse_quorum(value: &str) -> Result<QuorumThreshold, ConfigError> {
    let (numerator, denominator) = value
        .split_once('/')
        .ok_or_else(|| ConfigError::invalid("XA_QUORUM", value, "expected n/d"))?;
    QuorumThreshold::new(
        parse_number("XA_QUORUM", numerator)?,
        parse_number("XA_QUORUM", denominator)?,
    )
    .map_err(|e| ConfigError::invalid("XA_QUORUM", value, e))
}
