//! Collection orchestrator
//!
//! Owns one run's worth of collaborators: the conversation source, the payload
//! store, the error ledger, the channel list document and the rate limiter.

use crate::collector::config::CollectorConfig;
use crate::collector::rate_limit::RateLimiter;
use crate::collector::CollectError;
use crate::fetcher::{ConversationSource, FetcherResult, PaginationHelper};
use crate::resume::{ChannelListDocument, EntityStore, ErrorLedger, ErrorRecord};
use crate::{Channel, ChannelPayload};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Terminal state of one channel in a detail run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// A payload was already stored
    SkippedStored,
    /// The channel is in the error ledger and errors are not being retried
    SkippedErrored,
    /// Collected and stored
    Stored {
        /// Number of reactions stored
        reactions: usize,
    },
    /// A channel-scoped error abandoned the channel; it is now in the error ledger
    Failed,
}

impl ChannelOutcome {
    /// Whether the channel made network calls
    pub fn attempted(&self) -> bool {
        matches!(self, Self::Stored { .. } | Self::Failed)
    }
}

/// Counts for one detail run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Channels collected and stored in this run
    pub stored: usize,
    /// Channels skipped because they were already stored
    pub skipped_stored: usize,
    /// Channels skipped because of a previous failure
    pub skipped_errored: usize,
    /// Channels that failed in this run
    pub failed: usize,
    /// Ids of the channels that failed in this run
    pub failed_ids: Vec<String>,
    /// Reactions stored in this run
    pub reactions: usize,
}

impl RunSummary {
    fn record(&mut self, channel: &Channel, outcome: &ChannelOutcome) {
        match outcome {
            ChannelOutcome::SkippedStored => self.skipped_stored += 1,
            ChannelOutcome::SkippedErrored => self.skipped_errored += 1,
            ChannelOutcome::Stored { reactions } => {
                self.stored += 1;
                self.reactions += reactions;
            }
            ChannelOutcome::Failed => {
                self.failed += 1;
                self.failed_ids.push(channel.id.clone());
            }
        }
    }

    /// Channels that made network calls
    pub fn attempted(&self) -> usize {
        self.stored + self.failed
    }

    /// Channels skipped without network calls
    pub fn skipped(&self) -> usize {
        self.skipped_stored + self.skipped_errored
    }
}

/// Drives channel listing and per-channel reaction collection
pub struct CollectionOrchestrator<C, S> {
    source: C,
    store: S,
    ledger: ErrorLedger,
    channel_list: ChannelListDocument,
    config: CollectorConfig,
    rate_limiter: RateLimiter,
}

impl<C, S> CollectionOrchestrator<C, S>
where
    C: ConversationSource,
    S: EntityStore,
{
    /// Create an orchestrator for one run
    pub fn new(
        source: C,
        store: S,
        ledger: ErrorLedger,
        channel_list: ChannelListDocument,
        config: CollectorConfig,
    ) -> Self {
        let rate_limiter = RateLimiter::from_config(&config);
        Self {
            source,
            store,
            ledger,
            channel_list,
            config,
            rate_limiter,
        }
    }

    /// Run configuration
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Conversation source
    pub fn source(&self) -> &C {
        &self.source
    }

    /// Payload store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Error ledger
    pub fn ledger(&self) -> &ErrorLedger {
        &self.ledger
    }

    /// List every public channel and replace the channel list document
    ///
    /// Any fetch error aborts the listing; the previous document is left untouched.
    pub async fn list_channels(&self) -> Result<Vec<Channel>, CollectError> {
        let limit = self.config.page_limit;
        info!(limit = limit.get(), "Listing public channels");

        let channels = PaginationHelper::drain("conversations.list", &self.rate_limiter, |cursor| {
            self.source.list_channels(cursor, limit)
        })
        .await?;

        self.channel_list.save(&channels)?;
        info!(channels = channels.len(), "Channel listing complete");
        Ok(channels)
    }

    /// Load the saved channel list, listing channels first if none is saved or
    /// `relist` is set
    pub async fn load_or_list_channels(&self, relist: bool) -> Result<Vec<Channel>, CollectError> {
        if relist || !self.channel_list.exists() {
            return self.list_channels().await;
        }
        Ok(self.channel_list.load()?)
    }

    /// Collect and store the reactions of every pending channel, in order
    ///
    /// # Arguments
    /// * `channels` - Channels in listing order
    /// * `retry_errors` - Clear the error ledger first so failed channels are retried
    ///
    /// # Errors
    /// Permanent fetch errors and storage errors halt the run. Channels stored
    /// before the halt remain stored.
    pub async fn collect_reactions(
        &mut self,
        channels: &[Channel],
        retry_errors: bool,
    ) -> Result<RunSummary, CollectError> {
        if retry_errors {
            self.ledger.clear()?;
        }

        info!(
            channels = channels.len(),
            retry_errors = retry_errors,
            known_errors = self.ledger.len(),
            "Starting reaction collection"
        );

        let mut summary = RunSummary::default();
        for channel in channels {
            let outcome = self.process_channel(channel, retry_errors).await?;
            summary.record(channel, &outcome);

            if outcome.attempted() {
                self.rate_limiter.channel_completed().await;
            }
        }

        info!(
            stored = summary.stored,
            failed = summary.failed,
            skipped_stored = summary.skipped_stored,
            skipped_errored = summary.skipped_errored,
            reactions = summary.reactions,
            "Reaction collection finished"
        );
        Ok(summary)
    }

    async fn process_channel(
        &mut self,
        channel: &Channel,
        retry_errors: bool,
    ) -> Result<ChannelOutcome, CollectError> {
        if self.store.exists(&channel.id)? {
            debug!(channel_id = %channel.id, "Already stored, skipping");
            return Ok(ChannelOutcome::SkippedStored);
        }
        if !retry_errors && self.ledger.contains(&channel.id) {
            debug!(channel_id = %channel.id, "Previously failed, skipping");
            return Ok(ChannelOutcome::SkippedErrored);
        }

        info!(
            channel_id = %channel.id,
            channel_name = %channel.name,
            "Collecting channel reactions"
        );
        let started = Instant::now();
        let collected = self.collect_channel(channel).await;

        match collected {
            Ok(payload) => {
                self.store.write(&channel.id, &payload)?;
                crate::metrics::record_channel_stored(payload.len(), started.elapsed());
                Ok(ChannelOutcome::Stored {
                    reactions: payload.len(),
                })
            }
            Err(e) if e.is_channel_scoped() => {
                warn!(
                    channel_id = %channel.id,
                    channel_name = %channel.name,
                    error = %e,
                    "Channel collection failed, continuing with next channel"
                );
                crate::metrics::record_channel_failed(e.kind());
                self.ledger.append(ErrorRecord::for_channel(channel, &e))?;
                Ok(ChannelOutcome::Failed)
            }
            Err(e) => {
                error!(
                    channel_id = %channel.id,
                    channel_name = %channel.name,
                    error = %e,
                    "Permanent error, halting collection"
                );
                Err(e.into())
            }
        }
    }

    async fn collect_channel(&self, channel: &Channel) -> FetcherResult<ChannelPayload> {
        let limit = self.config.page_limit;
        let messages = PaginationHelper::drain(&channel.id, &self.rate_limiter, |cursor| {
            self.source.channel_history(&channel.id, cursor, limit)
        })
        .await?;

        Ok(messages
            .into_iter()
            .flat_map(|message| message.reactions)
            .collect())
    }
}
