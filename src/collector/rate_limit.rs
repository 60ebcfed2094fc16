//! Fixed-delay rate limiting
//!
//! Slack enforces a flat per-method ceiling and does not reward adaptive
//! strategies, so pacing is two fixed sleeps: one before every API call except the
//! first, and a cooldown after every N channels that reached the network.

use crate::collector::config::CollectorConfig;
use crate::fetcher::Pacer;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Sequential pacing for one collection run
#[derive(Debug)]
pub struct RateLimiter {
    page_delay: Duration,
    cooldown_every: usize,
    cooldown_delay: Duration,
    has_fetched: AtomicBool,
    channels_completed: AtomicUsize,
}

impl RateLimiter {
    /// Create a rate limiter
    ///
    /// # Arguments
    /// * `page_delay` - Sleep before every fetch after the first
    /// * `cooldown_every` - Channels between cooldowns (0 disables cooldowns)
    /// * `cooldown_delay` - Sleep applied at each cooldown
    pub fn new(page_delay: Duration, cooldown_every: usize, cooldown_delay: Duration) -> Self {
        Self {
            page_delay,
            cooldown_every,
            cooldown_delay,
            has_fetched: AtomicBool::new(false),
            channels_completed: AtomicUsize::new(0),
        }
    }

    /// Create a rate limiter from collection settings
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(config.page_delay, config.cooldown_every, config.cooldown_delay)
    }

    /// Rate limiter that never sleeps
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO, 0, Duration::ZERO)
    }

    /// Wait until the next fetch is permitted
    ///
    /// The first call returns immediately; every later call sleeps for the page delay.
    pub async fn before_fetch(&self) {
        if self.has_fetched.swap(true, Ordering::SeqCst) {
            Self::pause("page", self.page_delay).await;
        }
    }

    /// Count a channel that made network calls, cooling down on every Nth one
    ///
    /// # Returns
    /// Whether a cooldown was applied
    pub async fn channel_completed(&self) -> bool {
        let completed = self.channels_completed.fetch_add(1, Ordering::SeqCst) + 1;
        if self.cooldown_every == 0 || completed % self.cooldown_every != 0 {
            return false;
        }

        debug!(
            channels_completed = completed,
            cooldown_secs = self.cooldown_delay.as_secs_f64(),
            "Cooling down"
        );
        Self::pause("cooldown", self.cooldown_delay).await;
        true
    }

    /// Channels counted so far
    pub fn channels_completed(&self) -> usize {
        self.channels_completed.load(Ordering::SeqCst)
    }

    async fn pause(kind: &'static str, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        crate::metrics::record_rate_limit_pause(kind, delay);
        sleep(delay).await;
    }
}

#[async_trait]
impl Pacer for RateLimiter {
    async fn before_fetch(&self) {
        RateLimiter::before_fetch(self).await;
    }
}
