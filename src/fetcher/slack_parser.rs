//! Slack Web API response parsing
//!
//! Converts raw response bodies into typed pages. Every Slack method answers with
//! an `ok` flag; failures carry an `error` code which is mapped onto the
//! transient/permanent taxonomy here. Entries with an unexpected shape are logged
//! and dropped instead of being passed inward.

use crate::fetcher::{Cursor, FetcherError, FetcherResult, Page};
use crate::{is_valid_channel_id, Channel, CustomEmoji, Message, ReactionRecord};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Error codes caused by the token rather than the request target
const AUTH_ERROR_CODES: &[&str] = &[
    "not_authed",
    "invalid_auth",
    "account_inactive",
    "token_revoked",
    "token_expired",
    "no_permission",
    "missing_scope",
    "not_allowed_token_type",
    "ekm_access_denied",
];

/// Error codes caused by a malformed request
const REQUEST_ERROR_CODES: &[&str] = &[
    "invalid_arguments",
    "invalid_arg_name",
    "invalid_array_arg",
    "invalid_charset",
    "invalid_form_data",
    "invalid_post_type",
    "missing_post_type",
    "invalid_cursor",
    "invalid_limit",
    "invalid_types",
    "method_deprecated",
    "deprecated_endpoint",
];

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

// Entry lists are kept as raw values and decoded one entry at a time, so a
// single entry of the wrong shape is dropped instead of failing the page.

#[derive(Debug, Deserialize)]
struct ConversationsListResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channels: Option<Vec<Value>>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    is_archived: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ConversationsHistoryResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Option<Vec<Value>>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    ts: Option<Value>,
    #[serde(default)]
    reactions: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawReaction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct EmojiListResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    emoji: Option<BTreeMap<String, Value>>,
}

/// Map a Slack `error` code onto the fetcher taxonomy
pub fn classify_api_error(code: &str) -> FetcherError {
    if code == "ratelimited" || code == "rate_limited" {
        FetcherError::RateLimitExceeded
    } else if AUTH_ERROR_CODES.contains(&code) {
        FetcherError::AuthError(code.to_string())
    } else if REQUEST_ERROR_CODES.contains(&code) {
        FetcherError::InvalidRequest(code.to_string())
    } else {
        FetcherError::ApiError(code.to_string())
    }
}

fn decode<T: DeserializeOwned>(method: &str, body: &str) -> FetcherResult<T> {
    serde_json::from_str(body)
        .map_err(|e| FetcherError::ParseError(format!("{method}: failed to decode response: {e}")))
}

/// Decode each entry on its own, logging and skipping the ones that do not fit `T`
fn decode_entries<T: DeserializeOwned>(kind: &'static str, entries: Vec<Value>) -> Vec<T> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<T>(entry) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(entry = kind, error = %e, "Dropping malformed entry");
                None
            }
        })
        .collect()
}

fn check_ok(ok: bool, error: Option<String>) -> FetcherResult<()> {
    if ok {
        return Ok(());
    }
    let code = error.unwrap_or_else(|| "unknown_error".to_string());
    Err(classify_api_error(&code))
}

fn next_cursor(metadata: Option<ResponseMetadata>) -> Cursor {
    Cursor::from_token(metadata.and_then(|m| m.next_cursor))
}

/// Parse a `conversations.list` page
///
/// Channels without a name, or whose id cannot name a stored document, are dropped.
pub fn parse_channels_page(body: &str) -> FetcherResult<Page<Channel>> {
    let response: ConversationsListResponse = decode("conversations.list", body)?;
    check_ok(response.ok, response.error)?;

    let raw_channels: Vec<RawChannel> =
        decode_entries("channel", response.channels.unwrap_or_default());

    let mut channels = Vec::with_capacity(raw_channels.len());
    for raw in raw_channels {
        match (raw.id, raw.name) {
            (Some(id), Some(name)) if is_valid_channel_id(&id) => {
                channels.push(Channel::new(id, name, raw.is_archived.unwrap_or(false)));
            }
            (id, name) => {
                warn!(?id, ?name, "Dropping channel entry without a usable id or name");
            }
        }
    }

    Ok(Page::new(channels, next_cursor(response.response_metadata)))
}

/// Parse a `conversations.history` page
pub fn parse_history_page(body: &str) -> FetcherResult<Page<Message>> {
    let response: ConversationsHistoryResponse = decode("conversations.history", body)?;
    check_ok(response.ok, response.error)?;

    let messages = decode_entries::<RawMessage>("message", response.messages.unwrap_or_default())
        .into_iter()
        .map(|raw| Message {
            reactions: parse_reactions(raw.ts.as_ref(), raw.reactions.unwrap_or_default()),
        })
        .collect();

    Ok(Page::new(messages, next_cursor(response.response_metadata)))
}

fn parse_reactions(ts: Option<&Value>, raw: Vec<Value>) -> Vec<ReactionRecord> {
    decode_entries::<RawReaction>("reaction", raw)
        .into_iter()
        .filter_map(|reaction| match (reaction.name, reaction.count) {
            (Some(name), Some(count)) if !name.is_empty() => Some(ReactionRecord::new(name, count)),
            (name, count) => {
                warn!(message_ts = ?ts, ?name, ?count, "Dropping malformed reaction entry");
                None
            }
        })
        .collect()
}

/// Parse an `emoji.list` response
pub fn parse_emoji_list(body: &str) -> FetcherResult<Vec<CustomEmoji>> {
    let response: EmojiListResponse = decode("emoji.list", body)?;
    check_ok(response.ok, response.error)?;

    Ok(response
        .emoji
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, url)| match url {
            Value::String(url) => Some(CustomEmoji { name, url }),
            other => {
                warn!(name = %name, url = %other, "Dropping emoji entry without a URL");
                None
            }
        })
        .collect())
}
