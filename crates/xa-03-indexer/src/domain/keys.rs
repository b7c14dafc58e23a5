//! Key layout
//!
//! | Prefix | Key                                   | Value        |
//! |--------|---------------------------------------|--------------|
//! | `b/`   | block id                              | BlockRecord  |
//! | `h/`   | chain id, height, hash                | block id     |
//! | `m/`   | message id hash                       | MsgLink      |
//! | `c/`   | chain id, conf level                  | height       |
//! | `s/`   | `block_id`                            | next id      |
//!
//! Integers are big-endian so byte order is numeric order and prefix scans
//! return rows by ascending height.

use super::records::BlockId;
use shared_types::{ChainId, ConfLevel, Hash};

pub const BLOCK_PREFIX: &[u8] = b"b/";
pub const BLOCK_HEIGHT_PREFIX: &[u8] = b"h/";
pub const MSG_LINK_PREFIX: &[u8] = b"m/";
pub const CURSOR_PREFIX: &[u8] = b"c/";
pub const BLOCK_SEQUENCE_KEY: &[u8] = b"s/block_id";

fn key(prefix: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let len = prefix.len() + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.extend_from_slice(prefix);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

pub fn block(id: BlockId) -> Vec<u8> {
    key(BLOCK_PREFIX, &[&id.to_be_bytes()])
}

pub fn block_height(chain_id: ChainId, height: u64, hash: &Hash) -> Vec<u8> {
    key(
        BLOCK_HEIGHT_PREFIX,
        &[&chain_id.to_be_bytes(), &height.to_be_bytes(), hash],
    )
}

/// All blocks of a chain at `height`.
pub fn block_height_prefix(chain_id: ChainId, height: u64) -> Vec<u8> {
    key(
        BLOCK_HEIGHT_PREFIX,
        &[&chain_id.to_be_bytes(), &height.to_be_bytes()],
    )
}

/// All blocks of a chain.
pub fn chain_prefix(chain_id: ChainId) -> Vec<u8> {
    key(BLOCK_HEIGHT_PREFIX, &[&chain_id.to_be_bytes()])
}

/// Height encoded in a `block_height` key.
pub fn height_of(block_height_key: &[u8]) -> Option<u64> {
    let start = BLOCK_HEIGHT_PREFIX.len() + 8;
    let bytes = block_height_key.get(start..start + 8)?;
    Some(u64::from_be_bytes(bytes.try_into().ok()?))
}

/// Hash encoded in a `block_height` key.
pub fn hash_of(block_height_key: &[u8]) -> Option<Hash> {
    let start = BLOCK_HEIGHT_PREFIX.len() + 16;
    block_height_key.get(start..start + 32)?.try_into().ok()
}

pub fn msg_link(msg_hash: &Hash) -> Vec<u8> {
    key(MSG_LINK_PREFIX, &[msg_hash])
}

pub fn cursor(chain_id: ChainId, level: ConfLevel) -> Vec<u8> {
    key(CURSOR_PREFIX, &[&chain_id.to_be_bytes(), &[level.as_u8()]])
}

/// Chain id and level encoded in a cursor key.
pub fn parse_cursor(cursor_key: &[u8]) -> Option<(ChainId, ConfLevel)> {
    let rest = cursor_key.strip_prefix(CURSOR_PREFIX)?;
    if rest.len() != 9 {
        return None;
    }
    let chain_id = ChainId::from_be_bytes(rest[..8].try_into().ok()?);
    let level = ConfLevel::from_u8(rest[8])?;
    Some((chain_id, level))
}

pub fn encode_u64(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

pub fn decode_u64(bytes: &[u8]) -> Option<u64> {
    Some(u64::from_be_bytes(bytes.try_into().ok()?))
}
