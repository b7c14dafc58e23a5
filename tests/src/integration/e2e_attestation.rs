//! # End-to-End Attestation
//!
//! Validators stream chain blocks through xa-01, sign one vote per block,
//! and a single ordered pipeline feeds the votes to the xa-02 aggregator
//! and the resulting attestations to the xa-03 indexer.
//!
//! ## Flow Tested:
//!
//! 1. **XProvider (01) → signer**: every validator sees every block once, in order
//! 2. **Votes → Aggregator (02)**: quorum across validators, ordered surfacing
//! 3. **Aggregator (02) → Indexer (03)**: Block rows, MsgLinks and cursors
//! 4. **Restart**: resuming from the indexed cursor re-attests nothing

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    use shared_types::{Block, BlockPayload, ChainId, ConfLevel, MsgId};
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use xa_01_xprovider::adapters::MockBlockFetcher;
    use xa_01_xprovider::{
        BlockFetcher, CallbackError, Cancellation, FnCallback, StreamCallback, XProviderApi,
    };
    use xa_02_attestation::{
        Aggregator, AggregatorConfig, Attestation, AttestationApi, ChainRegistration,
        Ed25519VoteSigner, Ed25519VoteVerifier, ValidatorSet, Vote, VoteClaim, VoteSigner,
        VoteStatus,
    };
    use xa_03_indexer::{IndexQueryApi, IndexReader, Indexer, IndexerApi, InMemoryKVStore};

    use crate::fixtures::*;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Signs every delivered block and appends the vote to the shared log.
    fn voting_callback(
        signer: Arc<Ed25519VoteSigner>,
        votes: mpsc::Sender<Vote>,
    ) -> Arc<dyn StreamCallback<Block>> {
        Arc::new(FnCallback(move |block: Block| {
            let votes = votes.clone();
            let vote = signer.sign(&VoteClaim::for_block(&block));
            async move {
                votes
                    .send(vote)
                    .await
                    .map_err(|e| CallbackError::from(e.to_string()))
            }
        }))
    }

    /// Consumes votes in log order until `chain_id` is indexed up to `target`.
    async fn drive_pipeline(
        aggregator: &mut Aggregator<Ed25519VoteVerifier>,
        indexer: &mut Indexer<InMemoryKVStore>,
        fetcher: &MockBlockFetcher,
        votes: &mut mpsc::Receiver<Vote>,
        chain_id: ChainId,
        target: u64,
    ) -> Vec<Attestation> {
        let mut emitted = Vec::new();
        while aggregator.watermark(chain_id).unwrap().unwrap_or(0) < target {
            let vote = timeout(Duration::from_secs(5), votes.recv())
                .await
                .expect("timeout waiting for vote")
                .expect("vote log closed");
            let outcome = aggregator.submit_vote(&vote).unwrap();
            for attestation in outcome.emitted {
                let block = fetcher
                    .fetch_block(attestation.chain_id, attestation.height)
                    .await
                    .unwrap()
                    .expect("attested block is available");
                indexer.index(&attestation, &block).unwrap();
                emitted.push(attestation);
            }
        }
        emitted
    }

    // =============================================================================
    // INTEGRATION TESTS: XPROVIDER → AGGREGATOR → INDEXER
    // =============================================================================

    /// Three validators (30/30/10) stream chain 7 from its deploy height
    #[tokio::test]
    async fn test_validators_stream_attest_and_index_in_order() {
        let signers = signers(3);
        let network = devnet(&signers, &[30, 30, 10]);
        let fetcher = Arc::new(MockBlockFetcher::with_chain(SOURCE_CHAIN, 100, 10));
        let provider = provider(network.clone(), fetcher.clone());
        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        let (mut indexer, reader) = indexer();

        let (votes_tx, mut votes_rx) = mpsc::channel(256);
        let (shutdown, cancel) = Cancellation::channel();
        let mut streams = Vec::new();
        for signer in signers {
            let callback = voting_callback(Arc::new(signer), votes_tx.clone());
            // Height 0 is clamped up to the deploy height.
            streams.push(
                provider
                    .stream_async(SOURCE_CHAIN, 0, callback, cancel.clone())
                    .unwrap(),
            );
        }

        let emitted = drive_pipeline(
            &mut aggregator,
            &mut indexer,
            &fetcher,
            &mut votes_rx,
            SOURCE_CHAIN,
            109,
        )
        .await;

        let heights: Vec<u64> = emitted.iter().map(|a| a.height).collect();
        assert_eq!(heights, (100..=109).collect::<Vec<_>>());
        for attestation in &emitted {
            assert!(attestation.attested_power >= 47);
            assert_eq!(attestation.total_power, 70);
        }

        let rows = reader.approved_from(SOURCE_CHAIN, 100, 100).unwrap();
        assert_eq!(rows.len(), 10);
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(
            reader.cursor(SOURCE_CHAIN, ConfLevel::Finalized).unwrap(),
            Some(109)
        );

        shutdown.send(true).unwrap();
        for stream in streams {
            timeout(Duration::from_secs(5), stream)
                .await
                .expect("stream did not stop")
                .unwrap();
        }
    }

    /// Chain 7 at height 100: V1 and V2 approve H1; V3's later vote is a no-op
    #[tokio::test]
    async fn test_late_vote_after_quorum_changes_nothing() {
        let signers = signers(3);
        let network = devnet(&signers, &[30, 30, 10]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        let (mut indexer, reader) = indexer();

        let h1 = Block::new(SOURCE_CHAIN, 100, BlockPayload::default());
        let h2 = emitting_block(100, &[0]);
        assert_ne!(h1.hash, h2.hash);

        let first = aggregator
            .submit_vote(&signers[0].sign(&VoteClaim::for_block(&h1)))
            .unwrap();
        assert!(matches!(first.status, VoteStatus::Counted { power: 30, required: 47 }));

        let second = aggregator
            .submit_vote(&signers[1].sign(&VoteClaim::for_block(&h1)))
            .unwrap();
        assert_eq!(second.status, VoteStatus::Approved { held: false });
        assert_eq!(second.emitted.len(), 1);
        assert_eq!(second.emitted[0].attested_power, 60);
        indexer.index(&second.emitted[0], &h1).unwrap();

        let late = aggregator
            .submit_vote(&signers[2].sign(&VoteClaim::for_block(&h2)))
            .unwrap();
        assert_eq!(late.status, VoteStatus::AlreadyFinalized);
        assert!(late.emitted.is_empty());

        assert_eq!(aggregator.watermark(SOURCE_CHAIN).unwrap(), Some(100));
        let record = reader.block_at(SOURCE_CHAIN, 100).unwrap().unwrap();
        assert_eq!(record.hash, h1.hash);
        assert_eq!(record.signers, 2);
    }

    /// A message emitted on chain 7 is linked to its receipt on chain 9
    #[tokio::test]
    async fn test_message_lifecycle_across_chains() {
        let signers = signers(2);
        let network = devnet(&signers, &[50, 50]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        let (mut indexer, reader) = indexer();

        let origin = emitting_block(100, &[0, 1]);
        let receipt = receipt_block(1, &[0]);

        for block in [&origin, &receipt] {
            let claim = VoteClaim::for_block(block);
            let votes: Vec<Vote> = signers.iter().map(|s| s.sign(&claim)).collect();
            let batch = aggregator.submit_votes(&votes).unwrap();
            assert_eq!(batch.rejected(), 0);
            for attestation in batch.emitted() {
                let report = indexer.index(attestation, block).unwrap();
                assert!(!report.has_inconsistencies());
            }
        }

        let acked = reader
            .msg_link(&MsgId::new(SOURCE_CHAIN, DEST_CHAIN, 0).hash())
            .unwrap()
            .unwrap();
        assert!(acked.has_receipt());
        assert_eq!(acked.receipt_success, Some(true));
        let origin_row = reader.block_by_id(acked.origin_block_id).unwrap().unwrap();
        assert_eq!((origin_row.chain_id, origin_row.height), (SOURCE_CHAIN, 100));
        assert_eq!(origin_row.msg_count(), 2);

        let pending = reader
            .msg_link(&MsgId::new(SOURCE_CHAIN, DEST_CHAIN, 1).hash())
            .unwrap()
            .unwrap();
        assert!(!pending.has_receipt());
    }

    /// Receipts indexed before their origin are reported, not linked
    #[tokio::test]
    async fn test_receipt_before_origin_is_reported() {
        let signers = signers(1);
        let network = devnet(&signers, &[1]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        let (mut indexer, reader) = indexer();

        let receipt = receipt_block(1, &[5]);
        let outcome = aggregator
            .submit_vote(&signers[0].sign(&VoteClaim::for_block(&receipt)))
            .unwrap();
        let report = indexer.index(&outcome.emitted[0], &receipt).unwrap();

        assert_eq!(report.orphan_receipts, vec![MsgId::new(SOURCE_CHAIN, DEST_CHAIN, 5)]);
        assert!(reader
            .msg_link(&MsgId::new(SOURCE_CHAIN, DEST_CHAIN, 5).hash())
            .unwrap()
            .is_none());
        // The block itself is still indexed.
        assert_eq!(reader.cursor(DEST_CHAIN, ConfLevel::Finalized).unwrap(), Some(1));
    }

    // =============================================================================
    // INTEGRATION TESTS: RESTART
    // =============================================================================

    /// A restarted node registers at cursor + 1 and indexes only new blocks
    #[tokio::test]
    async fn test_restart_resumes_above_cursor() {
        let signers = signers(1);
        let network = devnet(&signers, &[10]);
        let fetcher = Arc::new(MockBlockFetcher::with_chain(SOURCE_CHAIN, 100, 6));
        let provider = provider(network.clone(), fetcher.clone());
        let signer = Arc::new(signers.into_iter().next().unwrap());
        let (mut indexer, reader) = indexer();

        // First run: heights 100..=102 are indexed.
        {
            let mut aggregator = aggregator(&network, AggregatorConfig::default());
            let (votes_tx, mut votes_rx) = mpsc::channel(16);
            let (shutdown, cancel) = Cancellation::channel();
            let stream = provider
                .stream_async(
                    SOURCE_CHAIN,
                    100,
                    voting_callback(signer.clone(), votes_tx),
                    cancel,
                )
                .unwrap();
            drive_pipeline(
                &mut aggregator,
                &mut indexer,
                &fetcher,
                &mut votes_rx,
                SOURCE_CHAIN,
                102,
            )
            .await;
            shutdown.send(true).unwrap();
            drop(votes_rx);
            timeout(Duration::from_secs(5), stream).await.unwrap().unwrap();
        }

        let cursor = reader
            .cursor(SOURCE_CHAIN, ConfLevel::Finalized)
            .unwrap()
            .unwrap();
        assert!(cursor >= 102);

        // Second run resumes from the index, not from the deploy height.
        let resume = cursor + 1;
        let mut aggregator = Aggregator::new(AggregatorConfig::default(), Ed25519VoteVerifier)
            .unwrap();
        aggregator
            .register_chain(ChainRegistration {
                chain_id: SOURCE_CHAIN,
                conf_level: ConfLevel::Finalized,
                start_height: resume,
                validators: ValidatorSet::from_specs(&network.validators),
            })
            .unwrap();
        assert_eq!(aggregator.watermark(SOURCE_CHAIN).unwrap(), Some(cursor));

        let (votes_tx, mut votes_rx) = mpsc::channel(16);
        let (shutdown, cancel) = Cancellation::channel();
        let stream = provider
            .stream_async(
                SOURCE_CHAIN,
                resume,
                voting_callback(signer, votes_tx),
                cancel,
            )
            .unwrap();
        let emitted = drive_pipeline(
            &mut aggregator,
            &mut indexer,
            &fetcher,
            &mut votes_rx,
            SOURCE_CHAIN,
            105,
        )
        .await;

        assert_eq!(emitted.first().map(|a| a.height), Some(resume));
        assert_eq!(
            reader.approved_from(SOURCE_CHAIN, 100, 100).unwrap().len(),
            6
        );

        shutdown.send(true).unwrap();
        drop(votes_rx);
        timeout(Duration::from_secs(5), stream).await.unwrap().unwrap();
    }

    /// The window holds out-of-order approvals until the gap is filled
    #[tokio::test]
    async fn test_out_of_order_blocks_surface_in_height_order() {
        let signers = signers(1);
        let network = devnet(&signers, &[1]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        let (mut indexer, reader) = indexer();

        let blocks: BTreeMap<u64, Block> = (100..104)
            .map(|h| (h, Block::new(SOURCE_CHAIN, h, BlockPayload::default())))
            .collect();

        for height in [103, 101, 102] {
            let outcome = aggregator
                .submit_vote(&signers[0].sign(&VoteClaim::for_block(&blocks[&height])))
                .unwrap();
            assert_eq!(outcome.status, VoteStatus::Approved { held: true });
            assert!(outcome.emitted.is_empty());
        }
        assert_eq!(
            aggregator.chain(SOURCE_CHAIN).unwrap().held_heights(),
            vec![101, 102, 103]
        );

        let outcome = aggregator
            .submit_vote(&signers[0].sign(&VoteClaim::for_block(&blocks[&100])))
            .unwrap();
        let heights: Vec<u64> = outcome.emitted.iter().map(|a| a.height).collect();
        assert_eq!(heights, vec![100, 101, 102, 103]);

        for attestation in &outcome.emitted {
            indexer
                .index(attestation, &blocks[&attestation.height])
                .unwrap();
        }
        assert_eq!(
            reader.cursor(SOURCE_CHAIN, ConfLevel::Finalized).unwrap(),
            Some(103)
        );
    }
}
