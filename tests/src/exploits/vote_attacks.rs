//! # Vote Attacks
//!
//! ## Attacks Simulated:
//!
//! 1. **Forgery**: a non-validator signs in a validator's name
//! 2. **Cross-chain replay**: a valid vote re-targeted at another chain
//! 3. **Equivocation**: one validator backs two hashes at one height
//! 4. **Window flooding**: votes far above the watermark
//! 5. **Vote stuffing**: a minority resubmits its votes to fake quorum
//! 6. **Evicted validator**: votes after a validator set change
//! 7. **Block substitution**: indexing an attestation with another block

#[cfg(test)]
mod tests {
    use shared_types::{Block, BlockPayload, ConfLevel, Hash};
    use xa_02_attestation::{
        AggregatorConfig, AttestError, AttestationApi, Ed25519VoteSigner, InvalidVoteReason,
        PruneReason, ValidatorSet, Vote, VoteClaim, VoteSigner, VoteStatus,
    };
    use xa_03_indexer::{IndexError, IndexQueryApi, IndexerApi};

    use crate::fixtures::*;

    const H1: Hash = [0x11; 32];
    const H2: Hash = [0x22; 32];

    // =============================================================================
    // ATTACK: SIGNATURES
    // =============================================================================

    /// A vote signed by an outsider but claiming a validator's id is rejected
    #[test]
    fn test_forged_signature_rejected() {
        let signers = signers(2);
        let network = devnet(&signers, &[50, 50]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        let attacker = Ed25519VoteSigner::from_seed([0xEE; 32]);

        let claim = VoteClaim::new(SOURCE_CHAIN, 100, H1);
        let forged = Vote::new(
            claim,
            signers[0].validator_id(),
            attacker.sign(&claim).signature,
        );

        let err = aggregator.submit_vote(&forged).unwrap_err();
        assert!(matches!(
            err,
            AttestError::InvalidVote {
                reason: InvalidVoteReason::BadSignature,
                ..
            }
        ));
        assert_eq!(
            aggregator.chain(SOURCE_CHAIN).unwrap().tally(100, &H1),
            0
        );
    }

    /// Outsiders signing with their own key are unknown validators
    #[test]
    fn test_outsider_vote_rejected() {
        let signers = signers(1);
        let network = devnet(&signers, &[10]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        let attacker = Ed25519VoteSigner::from_seed([0xEE; 32]);

        let err = aggregator
            .submit_vote(&attacker.sign(&VoteClaim::new(SOURCE_CHAIN, 100, H1)))
            .unwrap_err();

        assert!(matches!(
            err,
            AttestError::InvalidVote {
                reason: InvalidVoteReason::UnknownValidator,
                ..
            }
        ));
        assert!(aggregator.chain(SOURCE_CHAIN).unwrap().pending_heights().is_empty());
    }

    /// A vote for chain 7 cannot be replayed as a vote for chain 9
    #[test]
    fn test_cross_chain_replay_rejected() {
        let signers = signers(1);
        let network = devnet(&signers, &[10]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());

        let mut replayed = signers[0].sign(&VoteClaim::new(SOURCE_CHAIN, 100, H1));
        replayed.chain_id = DEST_CHAIN;
        replayed.height = 1;

        let err = aggregator.submit_vote(&replayed).unwrap_err();
        assert!(matches!(
            err,
            AttestError::InvalidVote {
                reason: InvalidVoteReason::BadSignature,
                ..
            }
        ));
        assert_eq!(aggregator.watermark(DEST_CHAIN).unwrap(), Some(0));
    }

    // =============================================================================
    // ATTACK: QUORUM MANIPULATION
    // =============================================================================

    /// The second hash from an equivocating validator carries no weight
    #[test]
    fn test_equivocation_adds_no_weight() {
        let signers = signers(3);
        let network = devnet(&signers, &[30, 30, 10]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());

        aggregator
            .submit_vote(&signers[0].sign(&VoteClaim::new(SOURCE_CHAIN, 100, H1)))
            .unwrap();
        let err = aggregator
            .submit_vote(&signers[0].sign(&VoteClaim::new(SOURCE_CHAIN, 100, H2)))
            .unwrap_err();

        match err {
            AttestError::Equivocation {
                height,
                existing,
                attempted,
                ..
            } => {
                assert_eq!(height, 100);
                assert_eq!(existing, H1);
                assert_eq!(attempted, H2);
            }
            other => panic!("expected equivocation, got {other:?}"),
        }
        let chain = aggregator.chain(SOURCE_CHAIN).unwrap();
        assert_eq!(chain.tally(100, &H1), 30);
        assert_eq!(chain.tally(100, &H2), 0);
    }

    /// Resubmitted votes are duplicates; a 40-of-70 minority never approves
    #[test]
    fn test_vote_stuffing_cannot_fake_quorum() {
        let signers = signers(3);
        let network = devnet(&signers, &[30, 30, 10]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        let claim = VoteClaim::new(SOURCE_CHAIN, 100, H2);

        for _ in 0..10 {
            for signer in [&signers[0], &signers[2]] {
                aggregator.submit_vote(&signer.sign(&claim)).unwrap();
            }
        }

        let stuffed = aggregator.submit_vote(&signers[0].sign(&claim)).unwrap();
        assert_eq!(stuffed.status, VoteStatus::Duplicate);
        assert_eq!(aggregator.chain(SOURCE_CHAIN).unwrap().tally(100, &H2), 40);
        assert_eq!(aggregator.watermark(SOURCE_CHAIN).unwrap(), Some(99));
    }

    /// Votes beyond the window are refused without creating candidates
    #[test]
    fn test_window_flooding_rejected() {
        let signers = signers(1);
        let network = devnet(&signers, &[10]);
        let config = AggregatorConfig {
            window_size: 16,
            ..AggregatorConfig::default()
        };
        let mut aggregator = aggregator(&network, config);

        let flood: Vec<Vote> = (116..116 + 64)
            .map(|h| signers[0].sign(&VoteClaim::new(SOURCE_CHAIN, h, H1)))
            .collect();
        let batch = aggregator.submit_votes(&flood).unwrap();

        assert_eq!(batch.rejected(), 64);
        assert!(batch.results.iter().all(|r| matches!(
            r,
            Err(AttestError::WindowExceeded { max_height: 115, .. })
        )));
        let chain = aggregator.chain(SOURCE_CHAIN).unwrap();
        assert!(chain.pending_heights().is_empty());
        assert!(chain.held_heights().is_empty());
    }

    /// A batch over the limit is refused whole
    #[test]
    fn test_oversized_batch_rejected() {
        let signers = signers(1);
        let network = devnet(&signers, &[10]);
        let config = AggregatorConfig {
            max_votes_per_batch: 4,
            ..AggregatorConfig::default()
        };
        let mut aggregator = aggregator(&network, config);

        let votes: Vec<Vote> = (100..105)
            .map(|h| signers[0].sign(&VoteClaim::new(SOURCE_CHAIN, h, H1)))
            .collect();

        assert!(matches!(
            aggregator.submit_votes(&votes),
            Err(AttestError::BatchTooLarge { size: 5, limit: 4 })
        ));
        assert_eq!(aggregator.watermark(SOURCE_CHAIN).unwrap(), Some(99));
    }

    /// A validator removed from the set loses its vote and its candidates
    #[test]
    fn test_evicted_validator_vote_rejected() {
        let signers = signers(3);
        let network = devnet(&signers, &[30, 30, 10]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        aggregator
            .submit_vote(&signers[2].sign(&VoteClaim::new(SOURCE_CHAIN, 100, H2)))
            .unwrap();

        let mut reduced = ValidatorSet::new();
        reduced.add_validator(signers[0].public_key(), 30);
        reduced.add_validator(signers[1].public_key(), 30);
        let pruned = aggregator
            .replace_validator_set(SOURCE_CHAIN, reduced)
            .unwrap();

        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].block_hash, H2);
        assert_eq!(pruned[0].reason, PruneReason::ValidatorSetChanged);
        let err = aggregator
            .submit_vote(&signers[2].sign(&VoteClaim::new(SOURCE_CHAIN, 100, H2)))
            .unwrap_err();
        assert!(matches!(
            err,
            AttestError::InvalidVote {
                reason: InvalidVoteReason::UnknownValidator,
                ..
            }
        ));
    }

    // =============================================================================
    // ATTACK: INDEX POISONING
    // =============================================================================

    /// An attestation paired with another block writes nothing
    #[test]
    fn test_block_substitution_rejected() {
        let signers = signers(1);
        let network = devnet(&signers, &[10]);
        let mut aggregator = aggregator(&network, AggregatorConfig::default());
        let (mut indexer, reader) = indexer();

        let honest = Block::new(SOURCE_CHAIN, 100, BlockPayload::default());
        let substitute = emitting_block(100, &[0]);
        let outcome = aggregator
            .submit_vote(&signers[0].sign(&VoteClaim::for_block(&honest)))
            .unwrap();

        let err = indexer.index(&outcome.emitted[0], &substitute).unwrap_err();
        assert!(matches!(err, IndexError::BlockMismatch { .. }));
        assert!(reader.block_at(SOURCE_CHAIN, 100).unwrap().is_none());
        assert_eq!(reader.cursor(SOURCE_CHAIN, ConfLevel::Finalized).unwrap(), None);
    }

    /// A second attestation for an indexed height with another hash conflicts
    #[test]
    fn test_conflicting_attestation_rejected() {
        let signers = signers(1);
        let honest_net = devnet(&signers, &[10]);
        let mut honest = aggregator(&honest_net, AggregatorConfig::default());
        let mut forked = aggregator(&honest_net, AggregatorConfig::default());
        let (mut indexer, reader) = indexer();

        let block_a = Block::new(SOURCE_CHAIN, 100, BlockPayload::default());
        let block_b = emitting_block(100, &[0]);
        let a = honest
            .submit_vote(&signers[0].sign(&VoteClaim::for_block(&block_a)))
            .unwrap();
        let b = forked
            .submit_vote(&signers[0].sign(&VoteClaim::for_block(&block_b)))
            .unwrap();

        indexer.index(&a.emitted[0], &block_a).unwrap();
        let err = indexer.index(&b.emitted[0], &block_b).unwrap_err();

        assert!(matches!(err, IndexError::ConflictingBlock { height: 100, .. }));
        assert_eq!(reader.block_at(SOURCE_CHAIN, 100).unwrap().unwrap().hash, block_a.hash);
    }
}
