//! Durable state for resumable collection runs
//!
//! Every piece of progress is its own document, written atomically:
//! one JSON file per collected channel, one channel list, one error ledger.
//! A run that dies halfway leaves every completed document valid.

mod atomic;
pub mod channel_list;
pub mod ledger;
pub mod lock;
pub mod store;

pub use channel_list::ChannelListDocument;
pub use ledger::{ErrorLedger, ErrorRecord};
pub use lock::RunLock;
pub use store::{EntityStore, JsonFileStore};

use std::path::{Path, PathBuf};

/// Default directory for the channel list and error ledger
pub const DEFAULT_STATE_DIR: &str = "channels";

/// Default directory for per-channel reaction documents
pub const DEFAULT_CHATS_DIR: &str = "chats";

const CHANNEL_LIST_FILENAME: &str = "channel_list.json";
const ERROR_LEDGER_FILENAME: &str = "channel_error_list.json";
const RUN_LOCK_FILENAME: &str = "harvest.lock";

/// Maximum document size accepted on read (64 MB) to prevent memory exhaustion
pub const MAX_DOCUMENT_SIZE: u64 = 64 * 1024 * 1024;

/// Filesystem locations of every persisted document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    state_dir: PathBuf,
    chats_dir: PathBuf,
}

impl StoragePaths {
    /// Create paths rooted at the given directories
    pub fn new(state_dir: impl Into<PathBuf>, chats_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            chats_dir: chats_dir.into(),
        }
    }

    /// Directory holding the channel list, error ledger and run lock
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Directory holding one document per collected channel
    pub fn chats_dir(&self) -> &Path {
        &self.chats_dir
    }

    /// Path of the channel list document
    pub fn channel_list_path(&self) -> PathBuf {
        self.state_dir.join(CHANNEL_LIST_FILENAME)
    }

    /// Path of the error ledger document
    pub fn error_ledger_path(&self) -> PathBuf {
        self.state_dir.join(ERROR_LEDGER_FILENAME)
    }

    /// Path of the single-instance run lock
    pub fn run_lock_path(&self) -> PathBuf {
        self.state_dir.join(RUN_LOCK_FILENAME)
    }

    /// Create both directories if missing
    pub fn ensure_dirs(&self) -> Result<(), ResumeError> {
        for dir in [&self.state_dir, &self.chats_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                ResumeError::IoError(format!("Failed to create directory {}: {e}", dir.display()))
            })?;
        }
        Ok(())
    }
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_DIR, DEFAULT_CHATS_DIR)
    }
}

/// Errors related to persisted state
#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("deserialization error: {0}")]
    DeserializationError(String),

    /// Lock error
    #[error("lock error: {0}")]
    LockError(String),

    /// Another run holds the run lock
    #[error("another collection run is already active (lock: {0})")]
    AlreadyRunning(String),

    /// Document too large to load
    #[error("document too large: {size} bytes (max: {max} bytes)")]
    DocumentTooLarge {
        /// Actual file size
        size: u64,
        /// Maximum allowed size
        max: u64,
    },

    /// Channel id that cannot be used as a document name
    #[error("invalid channel id: {0:?}")]
    InvalidChannelId(String),
}
