//! Advisory file locking for persisted state
//!
//! Implements advisory locking using fd-lock. Each guarded document gets a sibling
//! `.lock` file; the run lock keeps two collectors from sharing one state directory.

use super::ResumeError;
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Open (creating if needed) the `.lock` sibling of `path`
pub(crate) fn open_lock_file(path: &Path) -> Result<File, ResumeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ResumeError::IoError(e.to_string()))?;
        }
    }

    let lock_path = path.with_extension("lock");
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| ResumeError::LockError(format!("Failed to open lock file: {e}")))
}

/// Single-instance lock for a collection run
///
/// ```no_run
/// # use reaction_harvester::resume::RunLock;
/// # fn example() -> Result<(), reaction_harvester::resume::ResumeError> {
/// let mut run_lock = RunLock::open("channels/harvest.lock")?;
/// let _guard = run_lock.try_exclusive()?;
/// // ... collect while the guard is alive
/// # Ok(())
/// # }
/// ```
pub struct RunLock {
    lock: RwLock<File>,
    path: PathBuf,
}

impl RunLock {
    /// Open the lock file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ResumeError> {
        let path = path.into();
        let file = open_lock_file(&path)?;
        Ok(Self {
            lock: RwLock::new(file),
            path,
        })
    }

    /// Take the exclusive lock without blocking
    ///
    /// The lock is held until the returned guard is dropped.
    ///
    /// # Errors
    /// [`ResumeError::AlreadyRunning`] when another process or handle holds it
    pub fn try_exclusive(&mut self) -> Result<RwLockWriteGuard<'_, File>, ResumeError> {
        let path = self.path.display().to_string();
        match self.lock.try_write() {
            Ok(guard) => {
                debug!(path = %path, "Run lock acquired");
                Ok(guard)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(ResumeError::AlreadyRunning(path)),
            Err(e) => Err(ResumeError::LockError(format!("Failed to acquire lock: {e}"))),
        }
    }
}
