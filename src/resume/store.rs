//! Per-channel reaction storage
//!
//! A channel's document is written once, after every page of its history has been
//! collected. Its presence is the signal that the channel is done; callers check
//! [`EntityStore::exists`] and never overwrite.

use super::atomic::{read_json, write_json_atomic};
use super::ResumeError;
use crate::{is_valid_channel_id, ChannelPayload, ReactionRecord};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DOCUMENT_EXTENSION: &str = "json";

/// Iterator over every stored `(channel id, payload)` pair
pub type StoredPayloads<'a> =
    Box<dyn Iterator<Item = Result<(String, ChannelPayload), ResumeError>> + 'a>;

/// Write-once key-value storage of collected payloads
pub trait EntityStore {
    /// Whether a payload has already been stored for `id`
    fn exists(&self, id: &str) -> Result<bool, ResumeError>;

    /// Store the payload for `id`; callers must have checked [`EntityStore::exists`]
    fn write(&self, id: &str, payload: &[ReactionRecord]) -> Result<(), ResumeError>;

    /// Lazily read every stored payload, in no particular order
    fn read_all(&self) -> Result<StoredPayloads<'_>, ResumeError>;
}

/// On-disk payload shapes accepted when reading
///
/// Older runs stored one reaction list per message instead of a flat list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredPayload {
    Flat(Vec<ReactionRecord>),
    PerMessage(Vec<Vec<ReactionRecord>>),
}

impl From<StoredPayload> for ChannelPayload {
    fn from(stored: StoredPayload) -> Self {
        match stored {
            StoredPayload::Flat(records) => records,
            StoredPayload::PerMessage(messages) => messages.into_iter().flatten().collect(),
        }
    }
}

/// Store keeping one pretty-printed JSON document per channel
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the documents
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Document path for a channel id
    pub fn path_for(&self, id: &str) -> Result<PathBuf, ResumeError> {
        validate_channel_id(id)?;
        Ok(self.dir.join(format!("{id}.{DOCUMENT_EXTENSION}")))
    }

    fn load(path: &Path) -> Result<ChannelPayload, ResumeError> {
        read_json::<StoredPayload>(path).map(ChannelPayload::from)
    }
}

impl EntityStore for JsonFileStore {
    fn exists(&self, id: &str) -> Result<bool, ResumeError> {
        Ok(self.path_for(id)?.is_file())
    }

    fn write(&self, id: &str, payload: &[ReactionRecord]) -> Result<(), ResumeError> {
        let path = self.path_for(id)?;
        write_json_atomic(&path, payload)?;
        info!(
            channel_id = %id,
            reactions = payload.len(),
            path = %path.display(),
            "Channel reactions stored"
        );
        Ok(())
    }

    fn read_all(&self) -> Result<StoredPayloads<'_>, ResumeError> {
        if !self.dir.exists() {
            debug!(dir = %self.dir.display(), "Store directory missing, nothing to read");
            return Ok(Box::new(std::iter::empty()));
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            ResumeError::IoError(format!("Failed to read directory {}: {e}", self.dir.display()))
        })?;

        let documents = entries.filter_map(|entry| {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    return Some(Err(ResumeError::IoError(format!(
                        "Failed to read directory entry: {e}"
                    ))))
                }
            };
            if !path.is_file() || path.extension().map_or(true, |ext| ext != DOCUMENT_EXTENSION) {
                return None;
            }
            let id = path.file_stem()?.to_string_lossy().into_owned();
            Some(Self::load(&path).map(|payload| (id, payload)))
        });

        Ok(Box::new(documents))
    }
}

/// Reject ids that are empty or could escape the store directory
pub fn validate_channel_id(id: &str) -> Result<(), ResumeError> {
    if is_valid_channel_id(id) {
        Ok(())
    } else {
        Err(ResumeError::InvalidChannelId(id.to_string()))
    }
}
