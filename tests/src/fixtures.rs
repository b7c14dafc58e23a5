//! # Shared Fixtures
//!
//! A two-chain devnet: chain 7 (`mock_l1`, deployed at 100) emits messages
//! that chain 9 (`mock_l2`, deployed at 1) consumes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use shared_types::{
    Block, BlockPayload, ChainId, ChainSpec, ConfLevel, MsgId, NetworkSpec, ValidatorSpec, XMsg,
    XReceipt,
};
use xa_01_xprovider::adapters::MockBlockFetcher;
use xa_01_xprovider::{BackoffConfig, BlockFetcher, XProvider};
use xa_02_attestation::{
    Aggregator, AggregatorConfig, AttestationApi, ChainRegistration, Ed25519VoteSigner,
    Ed25519VoteVerifier, ValidatorSet, VoteSigner,
};
use xa_03_indexer::{InMemoryKVStore, IndexReader, Indexer};

pub const SOURCE_CHAIN: ChainId = 7;
pub const DEST_CHAIN: ChainId = 9;
pub const SOURCE_DEPLOY_HEIGHT: u64 = 100;
pub const DEST_DEPLOY_HEIGHT: u64 = 1;

/// Validator keys with deterministic seeds `[1; 32]`, `[2; 32]`, ...
pub fn signers(count: u8) -> Vec<Ed25519VoteSigner> {
    (1..=count)
        .map(|n| Ed25519VoteSigner::from_seed([n; 32]))
        .collect()
}

pub fn validator_specs(signers: &[Ed25519VoteSigner], powers: &[u64]) -> Vec<ValidatorSpec> {
    signers
        .iter()
        .zip(powers)
        .map(|(signer, &power)| ValidatorSpec {
            public_key: signer.public_key(),
            power,
        })
        .collect()
}

pub fn devnet(signers: &[Ed25519VoteSigner], powers: &[u64]) -> Arc<NetworkSpec> {
    Arc::new(NetworkSpec {
        name: "devnet".to_string(),
        chains: vec![
            ChainSpec {
                id: SOURCE_CHAIN,
                name: "mock_l1".to_string(),
                deploy_height: SOURCE_DEPLOY_HEIGHT,
                conf_level: ConfLevel::Finalized,
            },
            ChainSpec {
                id: DEST_CHAIN,
                name: "mock_l2".to_string(),
                deploy_height: DEST_DEPLOY_HEIGHT,
                conf_level: ConfLevel::Finalized,
            },
        ],
        validators: validator_specs(signers, powers),
    })
}

/// Aggregator with every chain of `network` registered at its deploy height.
pub fn aggregator(
    network: &NetworkSpec,
    config: AggregatorConfig,
) -> Aggregator<Ed25519VoteVerifier> {
    let mut aggregator =
        Aggregator::new(config, Ed25519VoteVerifier).expect("valid aggregator config");
    let validators = ValidatorSet::from_specs(&network.validators);
    for chain in &network.chains {
        aggregator
            .register_chain(ChainRegistration {
                chain_id: chain.id,
                conf_level: chain.conf_level,
                start_height: chain.deploy_height,
                validators: validators.clone(),
            })
            .expect("chain registers once");
    }
    aggregator
}

pub fn indexer() -> (Indexer<InMemoryKVStore>, IndexReader<InMemoryKVStore>) {
    let indexer = Indexer::new(Arc::new(InMemoryKVStore::new()));
    let reader = indexer.reader();
    (indexer, reader)
}

/// Provider serving both chains from one mock fetcher.
pub fn provider(network: Arc<NetworkSpec>, fetcher: Arc<MockBlockFetcher>) -> XProvider {
    let fetchers: BTreeMap<ChainId, Arc<dyn BlockFetcher>> = network
        .chain_ids()
        .map(|id| (id, fetcher.clone() as Arc<dyn BlockFetcher>))
        .collect();
    XProvider::new(network, fetchers).with_backoff(BackoffConfig::constant(Duration::from_millis(1)))
}

/// Block on chain 7 emitting one message per offset to chain 9.
pub fn emitting_block(height: u64, offsets: &[u64]) -> Block {
    let msgs = offsets
        .iter()
        .map(|&offset| XMsg {
            id: MsgId::new(SOURCE_CHAIN, DEST_CHAIN, offset),
            data: offset.to_be_bytes().to_vec(),
        })
        .collect();
    Block::new(
        SOURCE_CHAIN,
        height,
        BlockPayload {
            msgs,
            receipts: vec![],
        },
    )
}

/// Block on chain 9 acknowledging messages from chain 7.
pub fn receipt_block(height: u64, offsets: &[u64]) -> Block {
    let receipts = offsets
        .iter()
        .map(|&offset| XReceipt {
            msg_id: MsgId::new(SOURCE_CHAIN, DEST_CHAIN, offset),
            success: true,
        })
        .collect();
    Block::new(
        DEST_CHAIN,
        height,
        BlockPayload {
            msgs: vec![],
            receipts,
        },
    )
}
