//! Slack Web API HTTP client
//!
//! Issues one authenticated GET per call and maps transport-level failures onto
//! [`FetcherError`]. No retry happens here: a failed page abandons the channel being
//! collected and a later run picks it up again.

use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::fetcher::slack_parser::{parse_channels_page, parse_emoji_list, parse_history_page};
use crate::fetcher::{ConversationSource, Cursor, FetcherError, FetcherResult, Page, PageLimit};
use crate::{Channel, CustomEmoji, Message};
use async_trait::async_trait;

/// Production Slack Web API base URL
pub const SLACK_API_BASE_URL: &str = "https://slack.com/api";

/// Per-request timeout; history pages of busy channels can be slow
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Conversation types requested from `conversations.list`
const CHANNEL_TYPES: &str = "public_channel";

/// HTTP client for the Slack Web API
pub struct SlackHttpClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SlackHttpClient {
    /// Create a client against the production API
    pub fn new(token: impl Into<String>) -> FetcherResult<Self> {
        Self::with_base_url(token, SLACK_API_BASE_URL)
    }

    /// Create a client against a custom base URL (e.g. a mock server)
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> FetcherResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetcherError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a GET against a Web API method and return the raw body
    async fn get_text(&self, method: &str, params: &[(&str, String)]) -> FetcherResult<String> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(method = %method, params = params.len(), "Calling Slack API");

        let started = Instant::now();
        let response = match self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let err = FetcherError::NetworkError(e.to_string());
                crate::metrics::record_api_error(method, err.kind());
                warn!(method = %method, error = %e, "Network error calling Slack API");
                return Err(err);
            }
        };

        let status = response.status();
        crate::metrics::record_api_request(method, status.as_u16(), started.elapsed());

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            warn!(method = %method, retry_after = ?retry_after, "Slack API rate limit hit (429)");
            crate::metrics::record_api_error(method, FetcherError::RateLimitExceeded.kind());
            return Err(FetcherError::RateLimitExceeded);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());
            let err = FetcherError::HttpError {
                status: status.as_u16(),
                message,
            };
            crate::metrics::record_api_error(method, err.kind());
            warn!(method = %method, status = %status, "Slack API returned an error status");
            return Err(err);
        }

        response.text().await.map_err(|e| {
            let err = FetcherError::NetworkError(format!("failed to read response body: {e}"));
            crate::metrics::record_api_error(method, err.kind());
            err
        })
    }

    fn page_params(cursor: &Cursor, limit: PageLimit) -> Vec<(&'static str, String)> {
        let mut params = vec![("limit", limit.get().to_string())];
        if !cursor.is_end() {
            params.push(("cursor", cursor.as_str().to_string()));
        }
        params
    }

    fn tally_api_error<T>(method: &str, result: FetcherResult<T>) -> FetcherResult<T> {
        if let Err(e) = &result {
            crate::metrics::record_api_error(method, e.kind());
        }
        result
    }
}

#[async_trait]
impl ConversationSource for SlackHttpClient {
    async fn list_channels(
        &self,
        cursor: Cursor,
        limit: PageLimit,
    ) -> FetcherResult<Page<Channel>> {
        let method = "conversations.list";
        let mut params = Self::page_params(&cursor, limit);
        params.push(("types", CHANNEL_TYPES.to_string()));

        let body = self.get_text(method, &params).await?;
        Self::tally_api_error(method, parse_channels_page(&body))
    }

    async fn channel_history(
        &self,
        channel_id: &str,
        cursor: Cursor,
        limit: PageLimit,
    ) -> FetcherResult<Page<Message>> {
        let method = "conversations.history";
        let mut params = Self::page_params(&cursor, limit);
        params.push(("channel", channel_id.to_string()));

        let body = self.get_text(method, &params).await?;
        Self::tally_api_error(method, parse_history_page(&body))
    }

    async fn list_custom_emoji(&self) -> FetcherResult<Vec<CustomEmoji>> {
        let method = "emoji.list";
        let body = self.get_text(method, &[]).await?;
        Self::tally_api_error(method, parse_emoji_list(&body))
    }
}
