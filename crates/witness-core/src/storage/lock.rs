//! Advisory file locking for the filesystem backend.
//!
//! A single exclusive lock file at the store root serializes mutation across
//! processes. In-process serialization is handled separately by the backend's
//! own mutex; this guard exists so two processes sharing a store directory
//! cannot interleave appends or renames.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

/// Advisory lock errors.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The lock was still held by another process when the timeout expired.
    #[error("lock timed out after {waited:?} at {path}")]
    Timeout {
        /// Lock file path.
        path: PathBuf,
        /// How long acquisition was attempted.
        waited: Duration,
    },

    /// I/O failure while opening or locking the lock file.
    #[error("lock I/O error: {0}")]
    Io(#[from] io::Error),
}

/// RAII guard for the store-wide exclusive lock. Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Acquire an exclusive advisory lock, polling until `timeout` elapses.
    ///
    /// Creates the lock file (and its parent directory) if needed.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] if the lock stays contended, or
    /// [`LockError::Io`] on filesystem failure.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            if file.try_lock_exclusive().is_ok() {
                return Ok(Self { file });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
