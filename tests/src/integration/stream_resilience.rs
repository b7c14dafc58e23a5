//! # Stream Resilience
//!
//! XProvider streams under fetch failures, forged blocks, failing callbacks,
//! a full vote log and shutdown.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared_types::{Block, BlockPayload, ChainId};
    use tokio::sync::{mpsc, watch};
    use tokio::time::timeout;
    use xa_01_xprovider::adapters::MockBlockFetcher;
    use xa_01_xprovider::{
        BlockFetcher, CallbackError, Cancellation, FetchError, StreamCallback, StreamError,
        XProvider, XProviderApi,
    };

    use crate::fixtures::*;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Records successful deliveries; fails scripted heights a number of times.
    struct Recorder {
        delivered: Mutex<Vec<(ChainId, u64)>>,
        failures: Mutex<BTreeMap<(ChainId, u64), u32>>,
        attempts: AtomicU32,
        stop_after: usize,
        shutdown: watch::Sender<bool>,
    }

    impl Recorder {
        fn new(stop_after: usize) -> (Arc<Self>, Cancellation) {
            let (shutdown, cancel) = Cancellation::channel();
            let recorder = Arc::new(Self {
                delivered: Mutex::new(Vec::new()),
                failures: Mutex::new(BTreeMap::new()),
                attempts: AtomicU32::new(0),
                stop_after,
                shutdown,
            });
            (recorder, cancel)
        }

        fn fail(&self, chain_id: ChainId, height: u64, times: u32) {
            self.failures.lock().insert((chain_id, height), times);
        }

        fn heights(&self, chain_id: ChainId) -> Vec<u64> {
            self.delivered
                .lock()
                .iter()
                .filter(|(chain, _)| *chain == chain_id)
                .map(|(_, height)| *height)
                .collect()
        }
    }

    #[async_trait]
    impl StreamCallback<Block> for Recorder {
        async fn deliver(&self, block: &Block) -> Result<(), CallbackError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if let Some(remaining) = self.failures.lock().get_mut(&(block.chain_id, block.height)) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(format!("rejected height {}", block.height).into());
                }
            }
            let mut delivered = self.delivered.lock();
            delivered.push((block.chain_id, block.height));
            if delivered.len() >= self.stop_after {
                let _ = self.shutdown.send(true);
            }
            Ok(())
        }
    }

    /// Serves blocks from the wrong height until `forgeries` run out.
    struct ForgingFetcher {
        inner: MockBlockFetcher,
        forgeries: AtomicU32,
    }

    #[async_trait]
    impl BlockFetcher for ForgingFetcher {
        async fn fetch_block(
            &self,
            chain_id: ChainId,
            height: u64,
        ) -> Result<Option<Block>, FetchError> {
            let forge = self
                .forgeries
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if forge {
                return self.inner.fetch_block(chain_id, height + 1).await;
            }
            self.inner.fetch_block(chain_id, height).await
        }
    }

    fn single_chain_provider(fetcher: Arc<dyn BlockFetcher>) -> XProvider {
        let network = devnet(&signers(1), &[1]);
        XProvider::new(network, BTreeMap::from([(SOURCE_CHAIN, fetcher)]))
            .with_backoff(xa_01_xprovider::BackoffConfig::constant(Duration::from_millis(1)))
    }

    // =============================================================================
    // INTEGRATION TESTS: RETRIES
    // =============================================================================

    /// Failed deliveries are retried at the same height, never skipped
    #[tokio::test]
    async fn test_failed_delivery_is_retried_in_order() {
        let fetcher = Arc::new(MockBlockFetcher::with_chain(SOURCE_CHAIN, 100, 6));
        let provider = provider(devnet(&signers(1), &[1]), fetcher);
        let (recorder, cancel) = Recorder::new(6);
        recorder.fail(SOURCE_CHAIN, 102, 3);

        let handle = provider
            .stream_async(SOURCE_CHAIN, 100, recorder.clone(), cancel)
            .unwrap();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();

        assert_eq!(recorder.heights(SOURCE_CHAIN), (100..=105).collect::<Vec<_>>());
        assert_eq!(recorder.attempts.load(Ordering::SeqCst), 9);
    }

    /// Fetch failures on one chain do not disturb the other
    #[tokio::test]
    async fn test_transient_fetch_failures_on_both_chains() {
        let fetcher = Arc::new(MockBlockFetcher::new());
        for height in 100..104 {
            fetcher.insert(Block::new(SOURCE_CHAIN, height, BlockPayload::default()));
        }
        for height in 1..5 {
            fetcher.insert(Block::new(DEST_CHAIN, height, BlockPayload::default()));
        }
        fetcher.fail_next(SOURCE_CHAIN, 4);
        fetcher.fail_next(DEST_CHAIN, 2);
        let provider = provider(devnet(&signers(1), &[1]), fetcher.clone());
        let (recorder, cancel) = Recorder::new(8);

        let handles = [SOURCE_CHAIN, DEST_CHAIN].map(|chain| {
            provider
                .stream_async(chain, 0, recorder.clone(), cancel.clone())
                .unwrap()
        });
        for handle in handles {
            timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        }

        assert_eq!(recorder.heights(SOURCE_CHAIN), vec![100, 101, 102, 103]);
        assert_eq!(recorder.heights(DEST_CHAIN), vec![1, 2, 3, 4]);
        assert!(fetcher.fetch_count() >= 8 + 6);
    }

    /// A fetcher answering with the wrong block is rejected and retried
    #[tokio::test]
    async fn test_forged_block_is_rejected_and_retried() {
        let fetcher = Arc::new(ForgingFetcher {
            inner: MockBlockFetcher::with_chain(SOURCE_CHAIN, 100, 5),
            forgeries: AtomicU32::new(3),
        });
        let provider = single_chain_provider(fetcher);
        let (recorder, cancel) = Recorder::new(3);

        let handle = provider
            .stream_async(SOURCE_CHAIN, 100, recorder.clone(), cancel)
            .unwrap();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();

        assert_eq!(recorder.heights(SOURCE_CHAIN), vec![100, 101, 102]);
    }

    // =============================================================================
    // INTEGRATION TESTS: BACKPRESSURE AND SHUTDOWN
    // =============================================================================

    /// A full vote log stalls the stream instead of dropping blocks
    #[tokio::test]
    async fn test_full_vote_log_stalls_stream() {
        let fetcher = Arc::new(MockBlockFetcher::with_chain(SOURCE_CHAIN, 100, 20));
        let provider = provider(devnet(&signers(1), &[1]), fetcher.clone());
        let (votes_tx, mut votes_rx) = mpsc::channel::<u64>(1);
        let (shutdown, cancel) = Cancellation::channel();

        let callback = Arc::new(xa_01_xprovider::FnCallback(move |block: Block| {
            let votes = votes_tx.clone();
            async move {
                votes
                    .send(block.height)
                    .await
                    .map_err(|e| CallbackError::from(e.to_string()))
            }
        }));
        let handle = provider
            .stream_async(SOURCE_CHAIN, 100, callback, cancel)
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        // One queued, one blocked in send.
        assert!(fetcher.fetch_count() <= 2);

        let mut received = Vec::new();
        while received.len() < 20 {
            let height = timeout(Duration::from_secs(5), votes_rx.recv())
                .await
                .unwrap()
                .unwrap();
            received.push(height);
        }
        assert_eq!(received, (100..120).collect::<Vec<_>>());

        shutdown.send(true).unwrap();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    /// Shutdown ends a synchronous stream waiting for an unavailable block
    #[tokio::test]
    async fn test_shutdown_while_waiting_for_block() {
        let fetcher = Arc::new(MockBlockFetcher::with_chain(SOURCE_CHAIN, 100, 2));
        let provider = Arc::new(provider(devnet(&signers(1), &[1]), fetcher));
        let (recorder, _) = Recorder::new(usize::MAX);
        let (shutdown, cancel) = Cancellation::channel();

        let task = {
            let provider = provider.clone();
            let recorder = recorder.clone();
            tokio::spawn(async move {
                provider
                    .stream_blocks(SOURCE_CHAIN, 100, recorder, cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.send(true).unwrap();
        let result = timeout(Duration::from_secs(5), task).await.unwrap().unwrap();

        assert!(matches!(result, Err(StreamError::Canceled)));
        assert_eq!(recorder.heights(SOURCE_CHAIN), vec![100, 101]);
    }

    /// Synchronous streams surface the first callback failure with its height
    #[tokio::test]
    async fn test_sync_stream_reports_callback_failure() {
        let fetcher = Arc::new(MockBlockFetcher::with_chain(DEST_CHAIN, 1, 10));
        let provider = provider(devnet(&signers(1), &[1]), fetcher);
        let (recorder, cancel) = Recorder::new(usize::MAX);
        recorder.fail(DEST_CHAIN, 4, 1);

        let result = provider
            .stream_blocks(DEST_CHAIN, 1, recorder.clone(), cancel)
            .await;

        match result {
            Err(StreamError::Callback {
                chain_id, height, ..
            }) => assert_eq!((chain_id, height), (DEST_CHAIN, 4)),
            other => panic!("expected callback error, got {other:?}"),
        }
        assert_eq!(recorder.heights(DEST_CHAIN), vec![1, 2, 3]);
    }

    /// Unknown chains fail before any task is spawned
    #[tokio::test]
    async fn test_unknown_chain_rejected() {
        let provider = provider(devnet(&signers(1), &[1]), Arc::new(MockBlockFetcher::new()));
        let (recorder, cancel) = Recorder::new(1);

        let result = provider.stream_async(42, 0, recorder, cancel);

        assert!(matches!(result, Err(StreamError::UnknownChain(42))));
    }
}
