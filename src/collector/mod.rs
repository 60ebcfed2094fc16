//! Collection orchestration and rate limiting
//!
//! This module drives the two collection workflows against a
//! [`ConversationSource`](crate::fetcher::ConversationSource):
//!
//! 1. **Listing**: Drain `conversations.list` and save the channel list document
//! 2. **Detail collection**: For every channel not yet stored and not in the error
//!    ledger, drain its history, keep the reactions, and store them
//!
//! # Per-channel lifecycle
//!
//! ```text
//! PENDING ──► SKIPPED
//!    └──────► COLLECTING ──► STORED
//!                   └──────► FAILED (recorded in the error ledger)
//! ```
//!
//! A channel is never retried inside a run. Failed channels are retried on a
//! later run only when the error ledger is cleared (`retry_errors`).
//!
//! # Error Handling
//!
//! - Channel-scoped fetch errors (transient ones, undecodable history pages and
//!   runaway histories) are isolated to the channel being collected
//! - Auth and malformed-request errors halt the run
//! - Storage errors halt the run
//!
//! Everything stored before a halt stays valid and is skipped by the next run.
//!
//! # Components
//!
//! - [`orchestrator`] - The workflows and per-run summary
//! - [`rate_limit`] - Fixed-delay pacing
//! - [`config`] - Configuration constants and settings

pub mod config;
pub mod orchestrator;
pub mod rate_limit;

pub use config::CollectorConfig;
pub use orchestrator::{ChannelOutcome, CollectionOrchestrator, RunSummary};
pub use rate_limit::RateLimiter;

use crate::fetcher::FetcherError;
use crate::resume::ResumeError;

/// Collection errors that halt a run
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Permanent fetch failure, or any failure while listing channels
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Persisted state could not be read or written
    #[error("storage error: {0}")]
    ResumeError(#[from] ResumeError),
}
