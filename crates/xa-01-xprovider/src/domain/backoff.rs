//! # Exponential Backoff
//!
//! Bounded exponential delay with jitter and an explicit reset.
//!
//! ```text
//! delay(n) = min(base * multiplier^n, max) * (1 ± jitter)
//! ```
//!
//! Streams call `reset()` after every success so a single failure after a
//! long healthy run waits `base`, not whatever the last outage grew to.

use super::cancel::Cancellation;
use crate::error::StreamError;
use rand::Rng;
use std::time::Duration;

/// Backoff profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Delay after the first failure
    pub base_delay: Duration,
    /// Growth factor per consecutive failure (>= 1.0)
    pub multiplier: f64,
    /// Random spread as a fraction of the delay, in [0, 1]
    pub jitter: f64,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl BackoffConfig {
    /// Profile for polling source chains: retries quickly, caps at 5s.
    pub fn fast() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            multiplier: 1.6,
            jitter: 0.2,
            max_delay: Duration::from_secs(5),
        }
    }

    /// Profile for slow external dependencies.
    pub fn slow() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            multiplier: 1.6,
            jitter: 0.2,
            max_delay: Duration::from_secs(120),
        }
    }

    /// Fixed delay without growth or jitter.
    pub fn constant(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            multiplier: 1.0,
            jitter: 0.0,
            max_delay: delay,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(format!("multiplier must be >= 1.0, got {}", self.multiplier));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(format!("jitter must be within [0, 1], got {}", self.jitter));
        }
        if self.max_delay < self.base_delay {
            return Err("max_delay must not be below base_delay".to_string());
        }
        Ok(())
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::fast()
    }
}

/// Backoff state for one retry loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Consecutive failures since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Delay for the current attempt, then count the attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for(self.attempts);
        self.attempts = self.attempts.saturating_add(1);
        delay
    }

    fn delay_for(&self, attempts: u32) -> Duration {
        let max = self.config.max_delay.as_secs_f64();
        let grown = self.config.base_delay.as_secs_f64()
            * self.config.multiplier.powi(attempts.min(64) as i32);
        let capped = grown.min(max);

        let spread = if self.config.jitter > 0.0 {
            rand::thread_rng().gen_range(-self.config.jitter..=self.config.jitter)
        } else {
            0.0
        };
        let jittered = (capped * (1.0 + spread)).min(max);

        if jittered.is_finite() && jittered > 0.0 {
            Duration::from_secs_f64(jittered)
        } else {
            Duration::ZERO
        }
    }

    /// Sleep for the next delay unless canceled first.
    pub async fn wait(&mut self, cancel: &mut Cancellation) -> Result<(), StreamError> {
        let delay = self.next_delay();
        tokio::select! {
            biased;
            _ = cancel.canceled() => Err(StreamError::Canceled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
