//! # File Block Fetcher
//!
//! Source-chain client backed by a directory of JSON blocks:
//!
//! ```text
//! <root>/<chain_id>/<height>.json
//! ```
//!
//! A missing file means the block is not yet available. Anything else that
//! goes wrong is a fetch error the stream retries.

use async_trait::async_trait;
use shared_types::{Block, ChainId};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use xa_01_xprovider::{BlockFetcher, FetchError};

/// Reads blocks written by a source-chain follower.
#[derive(Debug, Clone)]
pub struct FileBlockFetcher {
    root: PathBuf,
}

impl FileBlockFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, chain_id: ChainId, height: u64) -> PathBuf {
        self.root
            .join(chain_id.to_string())
            .join(format!("{height}.json"))
    }

    /// Write `block` where this fetcher will find it.
    ///
    /// The file is written under a temporary name and renamed so a concurrent
    /// fetch never reads a partial block.
    pub fn publish(&self, block: &Block) -> std::io::Result<()> {
        let path = self.path_for(block.chain_id, block.height);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_vec_pretty(block)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)
    }
}

#[async_trait]
impl BlockFetcher for FileBlockFetcher {
    async fn fetch_block(
        &self,
        chain_id: ChainId,
        height: u64,
    ) -> Result<Option<Block>, FetchError> {
        let path = self.path_for(chain_id, height);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FetchError::Transport(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| FetchError::Decode(format!("{}: {}", path.display(), e)))
    }
}
