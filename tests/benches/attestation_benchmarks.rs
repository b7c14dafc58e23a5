//! # X-Attest Benchmarks
//!
//! | Crate | Measured |
//! |-----------|------------|
//! | xa-02 Attestation | vote authentication and tally, in and out of order |
//! | xa-03 Indexer | index one attested block with messages and receipts |

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared_types::Block;
use xa_02_attestation::{AggregatorConfig, AttestationApi, Vote, VoteClaim, VoteSigner};
use xa_03_indexer::IndexerApi;
use xa_tests::fixtures::*;

// ============================================================================
// XA-02: Vote Aggregation
// ============================================================================

/// Every validator's vote for `heights` consecutive chain 7 blocks.
fn signed_votes(validators: u8, heights: u64) -> (Vec<Vote>, Vec<u64>) {
    let signers = signers(validators);
    let powers = vec![10; signers.len()];
    let mut votes = Vec::new();
    for height in SOURCE_DEPLOY_HEIGHT..SOURCE_DEPLOY_HEIGHT + heights {
        let claim = VoteClaim::for_block(&emitting_block(height, &[height]));
        votes.extend(signers.iter().map(|s| s.sign(&claim)));
    }
    (votes, powers)
}

fn bench_vote_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("xa-02-attestation");

    for validators in [4u8, 16, 64] {
        let (votes, powers) = signed_votes(validators, 32);
        let network = devnet(&signers(validators), &powers);
        let config = AggregatorConfig::default();

        group.throughput(Throughput::Elements(votes.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("submit_in_order", validators),
            &votes,
            |b, votes| {
                b.iter_batched(
                    || aggregator(&network, config),
                    |mut aggregator| {
                        for vote in votes {
                            black_box(aggregator.submit_vote(vote).ok());
                        }
                    },
                    BatchSize::SmallInput,
                )
            },
        );

        let mut shuffled = votes.clone();
        shuffled.shuffle(&mut rand::rngs::StdRng::seed_from_u64(7));
        group.bench_with_input(
            BenchmarkId::new("submit_shuffled", validators),
            &shuffled,
            |b, votes| {
                b.iter_batched(
                    || aggregator(&network, config),
                    |mut aggregator| {
                        for vote in votes {
                            black_box(aggregator.submit_vote(vote).ok());
                        }
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

// ============================================================================
// XA-03: Indexing
// ============================================================================

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("xa-03-indexer");
    let signers = signers(1);
    let network = devnet(&signers, &[1]);

    for msgs in [0u64, 16, 256] {
        let blocks: Vec<Block> = (SOURCE_DEPLOY_HEIGHT..SOURCE_DEPLOY_HEIGHT + 64)
            .map(|height| {
                // Message offsets are unique across blocks.
                let offsets: Vec<u64> = (0..msgs).map(|o| height * 1_000 + o).collect();
                emitting_block(height, &offsets)
            })
            .collect();

        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        let attestations: Vec<_> = blocks
            .iter()
            .flat_map(|block| {
                aggregator
                    .submit_vote(&signers[0].sign(&VoteClaim::for_block(block)))
                    .map(|outcome| outcome.emitted)
                    .unwrap_or_default()
            })
            .collect();

        group.throughput(Throughput::Elements(blocks.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("index_blocks", msgs),
            &(attestations, blocks),
            |b, (attestations, blocks)| {
                b.iter_batched(
                    indexer,
                    |(mut indexer, _reader)| {
                        for (attestation, block) in attestations.iter().zip(blocks) {
                            black_box(indexer.index(attestation, block).ok());
                        }
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_vote_aggregation, bench_indexing);
criterion_main!(benches);
