//! Slack conversation fetchers

use crate::{Channel, CustomEmoji, Message};
use async_trait::async_trait;

pub mod pagination;
pub mod slack_http;
pub mod slack_parser;

pub use pagination::{Cursor, PageLimit, Pacer, PaginationHelper};

/// Fetcher errors
///
/// Every variant is either transient (it may succeed on a later run) or permanent.
/// During reaction collection, [`FetcherError::is_channel_scoped`] decides whether a
/// failure is recorded in the error ledger or halts the run.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Connection, timeout or body read failure
    #[error("network error: {0}")]
    NetworkError(String),

    /// HTTP 429 or a `ratelimited` API error
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Non-success HTTP status
    #[error("HTTP error {status}: {message}")]
    HttpError {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// `ok: false` with an error code scoped to the requested conversation
    #[error("API error: {0}")]
    ApiError(String),

    /// Token missing, invalid, revoked or lacking a scope
    #[error("authentication error: {0}")]
    AuthError(String),

    /// Request rejected as malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),

    /// Cursor never reached the end of the stream
    #[error("pagination did not terminate after {0} pages")]
    PaginationOverflow(usize),
}

impl FetcherError {
    /// Whether the failure is isolated to the current channel and may succeed on a later run
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NetworkError(_) | Self::RateLimitExceeded | Self::ApiError(_) => true,
            Self::HttpError { status, .. } => *status == 429 || *status >= 500,
            Self::AuthError(_)
            | Self::InvalidRequest(_)
            | Self::ParseError(_)
            | Self::PaginationOverflow(_) => false,
        }
    }

    /// Whether the failure should abandon only the channel being collected
    ///
    /// Covers every transient error, plus a history body that cannot be decoded
    /// and a history that never reaches its last page. Those last two repeat on
    /// every run, so they go to the error ledger instead of halting collection.
    pub fn is_channel_scoped(&self) -> bool {
        self.is_transient() || matches!(self, Self::ParseError(_) | Self::PaginationOverflow(_))
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkError(_) => "network",
            Self::RateLimitExceeded => "rate_limited",
            Self::HttpError { .. } => "http",
            Self::ApiError(_) => "api",
            Self::AuthError(_) => "auth",
            Self::InvalidRequest(_) => "invalid_request",
            Self::ParseError(_) => "parse",
            Self::PaginationOverflow(_) => "pagination_overflow",
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// One page of a cursor-paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in API order
    pub items: Vec<T>,
    /// Cursor for the following page; [`Cursor::is_end`] when this was the last one
    pub next_cursor: Cursor,
}

impl<T> Page<T> {
    /// Build a page
    pub fn new(items: Vec<T>, next_cursor: Cursor) -> Self {
        Self { items, next_cursor }
    }

    /// Build the final page of a listing
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, Cursor::end())
    }
}

/// Source of conversations, their history and workspace emoji
///
/// Implementations perform exactly one request per call; pacing between calls is
/// the caller's job (see [`PaginationHelper::drain`] and [`Pacer`]).
#[async_trait]
pub trait ConversationSource: Send + Sync {
    /// Fetch one page of public channels
    async fn list_channels(&self, cursor: Cursor, limit: PageLimit)
        -> FetcherResult<Page<Channel>>;

    /// Fetch one page of a channel's message history
    async fn channel_history(
        &self,
        channel_id: &str,
        cursor: Cursor,
        limit: PageLimit,
    ) -> FetcherResult<Page<Message>>;

    /// List the workspace's custom emoji
    async fn list_custom_emoji(&self) -> FetcherResult<Vec<CustomEmoji>>;
}
