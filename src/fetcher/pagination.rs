//! Cursor pagination shared by every Slack listing endpoint
//!
//! Slack hands back an opaque `next_cursor` with each page. Collection starts from
//! the empty cursor and stops once the API answers with an empty one. Absent and
//! empty cursors are folded into the same end-of-stream value at the parsing
//! boundary, so the loop below has a single termination check.
//!
//! Includes safety mechanisms:
//! - Maximum iteration limit to prevent infinite loops
//! - Page-size clamping to the range the API accepts

use crate::fetcher::{FetcherError, FetcherResult, Page};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use tracing::debug;

/// Maximum number of pages drained from one listing before giving up
pub const MAX_ITERATIONS: usize = 10_000;

/// Page size used when the requested one is zero or negative
pub const DEFAULT_PAGE_LIMIT: u32 = 200;

/// Largest page size the API accepts
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Opaque continuation token
///
/// The empty token both starts a listing and marks its end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    /// Cursor for the first page
    pub fn start() -> Self {
        Self(String::new())
    }

    /// Cursor signalling that no further page exists
    pub fn end() -> Self {
        Self(String::new())
    }

    /// Build a cursor from a raw token; `None` and `""` both mean end of stream
    pub fn from_token(token: Option<String>) -> Self {
        Self(token.unwrap_or_default())
    }

    /// Whether this cursor terminates the listing
    pub fn is_end(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw token as sent to the API
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            f.write_str("<none>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Page size clamped to `[1, MAX_PAGE_LIMIT]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimit(u32);

impl PageLimit {
    /// Clamp a requested page size.
    ///
    /// Values below 1 fall back to [`DEFAULT_PAGE_LIMIT`]; values above
    /// [`MAX_PAGE_LIMIT`] are capped.
    pub fn clamped(requested: i64) -> Self {
        if requested < 1 {
            Self(DEFAULT_PAGE_LIMIT)
        } else if requested > i64::from(MAX_PAGE_LIMIT) {
            Self(MAX_PAGE_LIMIT)
        } else {
            Self(requested as u32)
        }
    }

    /// Effective page size
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageLimit {
    fn default() -> Self {
        Self(DEFAULT_PAGE_LIMIT)
    }
}

impl fmt::Display for PageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pacing applied before each page fetch
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait until the next fetch is permitted
    async fn before_fetch(&self);
}

/// Pagination helper for cursor-based listings
pub struct PaginationHelper;

impl PaginationHelper {
    /// Drain a listing from the empty cursor to the end of the stream
    ///
    /// # Arguments
    /// * `label` - What is being listed, for logs
    /// * `pacer` - Waited on before every fetch
    /// * `fetch_fn` - Fetches the page for the given cursor
    ///
    /// # Returns
    /// All items across all pages, in order
    ///
    /// # Errors
    /// The first fetch error aborts the drain and is returned unchanged. Exceeding
    /// [`MAX_ITERATIONS`] yields [`FetcherError::PaginationOverflow`].
    pub async fn drain<T, F, Fut, P>(
        label: &str,
        pacer: &P,
        mut fetch_fn: F,
    ) -> FetcherResult<Vec<T>>
    where
        P: Pacer + ?Sized,
        F: FnMut(Cursor) -> Fut,
        Fut: Future<Output = FetcherResult<Page<T>>>,
    {
        let mut all_items = Vec::new();
        let mut cursor = Cursor::start();
        let mut iteration = 0;

        loop {
            if iteration >= MAX_ITERATIONS {
                return Err(FetcherError::PaginationOverflow(MAX_ITERATIONS));
            }

            pacer.before_fetch().await;

            debug!(
                label = %label,
                page = iteration + 1,
                cursor = %cursor,
                "Fetching page"
            );

            let page = fetch_fn(cursor).await?;
            iteration += 1;

            debug!(
                label = %label,
                page = iteration,
                items = page.items.len(),
                "Received page"
            );

            all_items.extend(page.items);

            if page.next_cursor.is_end() {
                break;
            }
            cursor = page.next_cursor;
        }

        debug!(
            label = %label,
            pages = iteration,
            total_items = all_items.len(),
            "Pagination completed"
        );

        Ok(all_items)
    }
}
