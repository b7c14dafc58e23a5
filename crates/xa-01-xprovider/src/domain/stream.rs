//! # Retry-Safe Streamer
//!
//! Generic driver turning an unreliable element source into an ordered,
//! verified sequence of deliveries.
//!
//! ## Retry Policy
//!
//! | Event | Counted as | Action |
//! |-------|------------|--------|
//! | `fetch` → `Ok(None)` | nothing | backoff, same height |
//! | `fetch` → `Err` | fetch error | backoff, same height |
//! | `verify` → `Err` | fetch error | backoff, same height |
//! | `deliver` → `Err`, retrying | callback error | backoff, same element |
//! | `deliver` → `Err`, sync | - | return the error |
//! | shutdown | - | return `Canceled` |
//!
//! Heights advance by exactly one per successful delivery and never move
//! backwards.

use super::backoff::{Backoff, BackoffConfig};
use super::cancel::Cancellation;
use crate::error::{StreamError, StreamResult};
use crate::ports::outbound::{ElementSource, StreamCallback, StreamMetrics};
use shared_types::ChainId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Behavior knobs of a stream.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Element name used in logs ("block", "attestation").
    pub elem_label: &'static str,
    /// Retry failed deliveries forever instead of returning the error.
    pub retry_delivery: bool,
    pub backoff: BackoffConfig,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            elem_label: "block",
            retry_delivery: true,
            backoff: BackoffConfig::fast(),
        }
    }
}

/// One chain's stream: a source, a callback and metric handles.
pub struct Streamer<S, C> {
    source: S,
    callback: C,
    metrics: Arc<dyn StreamMetrics>,
    options: StreamOptions,
}

impl<S, C> Streamer<S, C> {
    pub fn new(source: S, callback: C, metrics: Arc<dyn StreamMetrics>, options: StreamOptions) -> Self {
        Self {
            source,
            callback,
            metrics,
            options,
        }
    }

    /// Stream elements from `from_height` until canceled or, in sync mode,
    /// until a delivery fails.
    ///
    /// Never returns `Ok`. In retrying mode the only possible outcome is
    /// [`StreamError::Canceled`].
    pub async fn run<E>(
        &self,
        chain_id: ChainId,
        from_height: u64,
        mut cancel: Cancellation,
    ) -> StreamResult<()>
    where
        E: Send + Sync,
        S: ElementSource<E>,
        C: StreamCallback<E>,
    {
        let label = self.options.elem_label;
        let mut backoff = Backoff::new(self.options.backoff);
        let mut height = from_height;

        loop {
            if cancel.is_canceled() {
                return Err(StreamError::Canceled);
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.canceled() => return Err(StreamError::Canceled),
                fetched = self.source.fetch(chain_id, height) => fetched,
            };

            let elem = match fetched {
                Ok(Some(elem)) => elem,
                Ok(None) => {
                    debug!(chain_id, height, "[xa-01] {} not available yet", label);
                    backoff.wait(&mut cancel).await?;
                    continue;
                }
                Err(err) => {
                    self.metrics.inc_fetch_err();
                    warn!(
                        chain_id,
                        height,
                        attempt = backoff.attempts() + 1,
                        error = %err,
                        "[xa-01] Failure fetching next {} (will retry)",
                        label
                    );
                    backoff.wait(&mut cancel).await?;
                    continue;
                }
            };

            if let Err(err) = self.source.verify(chain_id, height, &elem) {
                self.metrics.inc_fetch_err();
                warn!(
                    chain_id,
                    height,
                    error = %err,
                    "[xa-01] Invalid {} fetched (will retry)",
                    label
                );
                backoff.wait(&mut cancel).await?;
                continue;
            }
            backoff.reset();

            self.deliver(chain_id, height, &elem, &mut backoff, &mut cancel)
                .await?;
            backoff.reset();

            self.metrics.set_stream_height(height);
            height = height
                .checked_add(1)
                .ok_or(StreamError::HeightOverflow(chain_id))?;
        }
    }

    async fn deliver<E>(
        &self,
        chain_id: ChainId,
        height: u64,
        elem: &E,
        backoff: &mut Backoff,
        cancel: &mut Cancellation,
    ) -> StreamResult<()>
    where
        E: Send + Sync,
        C: StreamCallback<E>,
    {
        let label = self.options.elem_label;
        loop {
            if cancel.is_canceled() {
                return Err(StreamError::Canceled);
            }

            let err = match self.callback.deliver(elem).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            if !self.options.retry_delivery {
                return Err(StreamError::Callback {
                    chain_id,
                    height,
                    label,
                    source: err,
                });
            }

            self.metrics.inc_callback_err();
            warn!(
                chain_id,
                height,
                attempt = backoff.attempts() + 1,
                error = %err,
                "[xa-01] Failure processing {} callback (will retry)",
                label
            );
            backoff.wait(cancel).await?;
        }
    }
}
