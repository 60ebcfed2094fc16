//! Error ledger of channels whose collection failed
//!
//! The ledger is a single JSON array rewritten as a whole on every append. Error
//! volume is small next to channel volume, so a read-modify-write under an
//! advisory lock is enough.

use super::atomic::{read_json, write_json_atomic};
use super::lock::open_lock_file;
use super::ResumeError;
use crate::Channel;
use chrono::{DateTime, Utc};
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A channel whose collection failed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorRecord {
    /// Channel id
    pub id: String,
    /// Channel name
    pub name: String,
    /// Whether the channel was archived when listed
    #[serde(default)]
    pub is_archived: bool,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the failure was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl ErrorRecord {
    /// Build a record for a channel that failed with `error`
    pub fn for_channel(channel: &Channel, error: impl ToString) -> Self {
        Self {
            id: channel.id.clone(),
            name: channel.name.clone(),
            is_archived: channel.is_archived,
            error: Some(error.to_string()),
            recorded_at: Some(Utc::now()),
        }
    }
}

/// Durable, deduplicated list of failed channels
#[derive(Debug)]
pub struct ErrorLedger {
    path: PathBuf,
    records: Vec<ErrorRecord>,
}

impl ErrorLedger {
    /// Open the ledger at `path`, loading existing records if the document exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ResumeError> {
        let path = path.into();
        let records = Self::load_records(&path)?;
        debug!(path = %path.display(), records = records.len(), "Error ledger opened");
        Ok(Self { path, records })
    }

    /// Path of the ledger document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `id` has a recorded failure
    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|record| record.id == id)
    }

    /// Recorded failures, oldest first
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Number of recorded failures
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no failure is recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record unless one with the same id exists
    ///
    /// Re-reads the document under an exclusive lock, appends, and rewrites it
    /// atomically.
    ///
    /// # Returns
    /// `true` if the record was added, `false` if the id was already present
    pub fn append(&mut self, record: ErrorRecord) -> Result<bool, ResumeError> {
        let lock_file = open_lock_file(&self.path)?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .write()
            .map_err(|e| ResumeError::LockError(format!("Failed to acquire write lock: {e}")))?;

        self.records = Self::load_records(&self.path)?;
        if self.contains(&record.id) {
            debug!(channel_id = %record.id, "Channel already in error ledger");
            return Ok(false);
        }

        warn!(
            channel_id = %record.id,
            channel_name = %record.name,
            error = ?record.error,
            "Recording channel in error ledger"
        );
        self.records.push(record);
        write_json_atomic(&self.path, &self.records)?;
        Ok(true)
    }

    /// Delete the whole ledger so every failed channel is retried
    pub fn clear(&mut self) -> Result<(), ResumeError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(
                    path = %self.path.display(),
                    cleared = self.records.len(),
                    "Error ledger cleared"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ResumeError::IoError(format!(
                    "Failed to remove {}: {e}",
                    self.path.display()
                )))
            }
        }
        self.records.clear();
        Ok(())
    }

    fn load_records(path: &Path) -> Result<Vec<ErrorRecord>, ResumeError> {
        if path.is_file() {
            read_json(path)
        } else {
            Ok(Vec::new())
        }
    }
}
