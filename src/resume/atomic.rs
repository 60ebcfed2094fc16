//! Atomic JSON document IO
//!
//! Writes go to a temp file in the target directory, are synced, then renamed over
//! the target, so readers only ever see a complete previous or complete new
//! document.

use super::{ResumeError, MAX_DOCUMENT_SIZE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Serialize `value` as pretty JSON and atomically replace `path` with it
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), ResumeError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ResumeError::SerializationError(e.to_string()))?;

    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent_dir).map_err(|e| ResumeError::IoError(e.to_string()))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
        .map_err(|e| ResumeError::IoError(format!("Failed to create temp file: {e}")))?;

    temp_file
        .write_all(json.as_bytes())
        .map_err(|e| ResumeError::IoError(format!("Failed to write to temp file: {e}")))?;

    temp_file
        .flush()
        .map_err(|e| ResumeError::IoError(format!("Failed to flush temp file: {e}")))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| ResumeError::IoError(format!("Failed to sync temp file: {e}")))?;

    temp_file
        .persist(path)
        .map_err(|e| ResumeError::IoError(format!("Failed to persist temp file: {e}")))?;

    // Fsync parent directory so the rename itself is durable
    if let Ok(dir) = std::fs::File::open(parent_dir) {
        let _ = dir.sync_all();
    }

    debug!(path = %path.display(), bytes = json.len(), "Document written");
    Ok(())
}

/// Load a JSON document, refusing files above [`MAX_DOCUMENT_SIZE`]
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ResumeError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| ResumeError::IoError(format!("{}: {e}", path.display())))?;
    if metadata.len() > MAX_DOCUMENT_SIZE {
        return Err(ResumeError::DocumentTooLarge {
            size: metadata.len(),
            max: MAX_DOCUMENT_SIZE,
        });
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ResumeError::IoError(format!("{}: {e}", path.display())))?;

    serde_json::from_str(&contents)
        .map_err(|e| ResumeError::DeserializationError(format!("{}: {e}", path.display())))
}
