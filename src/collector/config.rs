//! Collection configuration

use crate::fetcher::PageLimit;
use std::time::Duration;

/// Quiet interval between two consecutive API calls.
/// The Slack tier for `conversations.history` allows roughly one call per second
/// sustained, with bursts punished by long lockouts; five seconds stays well clear.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(5);

/// Number of channels that hit the network before an extra cooldown
pub const COOLDOWN_EVERY_CHANNELS: usize = 11;

/// Length of the cooldown after every [`COOLDOWN_EVERY_CHANNELS`] channels
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Settings for one collection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Page size requested from every listing endpoint
    pub page_limit: PageLimit,
    /// Delay before every API call after the first
    pub page_delay: Duration,
    /// Channels collected between two cooldowns; 0 disables the cooldown
    pub cooldown_every: usize,
    /// Delay applied at each cooldown
    pub cooldown_delay: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            page_limit: PageLimit::default(),
            page_delay: DEFAULT_PAGE_DELAY,
            cooldown_every: COOLDOWN_EVERY_CHANNELS,
            cooldown_delay: DEFAULT_COOLDOWN,
        }
    }
}

impl CollectorConfig {
    /// Configuration with every delay set to zero
    pub fn unthrottled() -> Self {
        Self {
            page_delay: Duration::ZERO,
            cooldown_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Set the page size, clamping it to the accepted range
    pub fn with_page_limit(mut self, requested: i64) -> Self {
        self.page_limit = PageLimit::clamped(requested);
        self
    }

    /// Set both the page delay and the cooldown delay
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self.cooldown_delay = delay;
        self
    }

    /// Set how many channels are collected between cooldowns
    pub fn with_cooldown_every(mut self, channels: usize) -> Self {
        self.cooldown_every = channels;
        self
    }
}
