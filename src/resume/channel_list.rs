//! Channel list document
//!
//! The full channel listing is stored as one document and replaced wholesale
//! whenever channels are re-listed.

use super::atomic::{read_json, write_json_atomic};
use super::ResumeError;
use crate::{is_valid_channel_id, Channel};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Persisted list of every channel known to the collector
#[derive(Debug, Clone)]
pub struct ChannelListDocument {
    path: PathBuf,
}

impl ChannelListDocument {
    /// Document stored at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a listing has been saved
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the saved listing, dropping channels whose id cannot name a document
    pub fn load(&self) -> Result<Vec<Channel>, ResumeError> {
        let mut channels: Vec<Channel> = read_json(&self.path)?;
        channels.retain(|channel| {
            let valid = is_valid_channel_id(&channel.id);
            if !valid {
                warn!(
                    channel_id = ?channel.id,
                    channel_name = %channel.name,
                    "Skipping channel with unusable id"
                );
            }
            valid
        });
        info!(
            path = %self.path.display(),
            channels = channels.len(),
            "Channel list loaded"
        );
        Ok(channels)
    }

    /// Replace the saved listing
    pub fn save(&self, channels: &[Channel]) -> Result<(), ResumeError> {
        write_json_atomic(&self.path, channels)?;
        info!(
            path = %self.path.display(),
            channels = channels.len(),
            "Channel list saved"
        );
        Ok(())
    }
}
