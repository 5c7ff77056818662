//! Filesystem storage backend — one JSONL file per stream.
//!
//! # Directory layout
//!
//! ```text
//! <root>/
//!   lock                      # store-wide advisory lock
//!   streams/
//!     <sha256-of-key>.stream  # one file per stream
//! ```
//!
//! Stream keys are hashed to fixed-length filenames so arbitrary key content
//! (JSON, reserved prefixes) can never cause path traversal or
//! special-character issues. Each file begins with two header comment lines
//! recording the format version and the original key, so enumeration can
//! recover keys after a restart:
//!
//! ```text
//! # witness stream v1
//! # key: {"student":["Alice"],"tool":["editor"]}
//! {"hash":"...","children":[...],...}
//! ```
//!
//! Appends use `O_APPEND` + `write_all` + `flush`, one JSON object per line.
//! Mutations additionally take the store-wide advisory file lock so that two
//! processes sharing a root directory cannot interleave writes.

use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use sha2::{Digest, Sha256};

use super::lock::StoreLock;
use super::{Record, StorageError, StreamStorage};

/// Format marker written as the first line of every stream file.
const STREAM_HEADER: &str = "# witness stream v1";

/// Prefix of the header line that records the stream key.
const KEY_PREFIX: &str = "# key: ";

/// How long mutations wait for the store-wide advisory lock.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// One-file-per-stream backend with coarse locking.
#[derive(Debug)]
pub struct FsStorage {
    root: PathBuf,
    // Serializes in-process mutation; the advisory file lock covers other
    // processes.
    write_mutex: Mutex<()>,
}

impl FsStorage {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(root.join("streams"))?;
        Ok(Self {
            root,
            write_mutex: Mutex::new(()),
        })
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join("lock")
    }

    fn streams_dir(&self) -> PathBuf {
        self.root.join("streams")
    }

    /// Map a stream key to its file path (SHA-256 of the key bytes).
    fn stream_path(&self, stream: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(stream.as_bytes());
        let name = format!("{:x}.stream", hasher.finalize());
        self.streams_dir().join(name)
    }

    fn header_block(stream: &str) -> String {
        format!("{STREAM_HEADER}\n{KEY_PREFIX}{stream}\n")
    }

    /// Parse one stream file into its recorded key and records.
    fn parse_file(path: &Path) -> Result<(Option<String>, Vec<Record>), StorageError> {
        let content = fs::read_to_string(path)?;
        let mut key = None;
        let mut records = Vec::new();

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix(KEY_PREFIX) {
                key = Some(rest.to_string());
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            let record: Record =
                serde_json::from_str(line).map_err(|err| StorageError::Corrupt {
                    stream: path.display().to_string(),
                    detail: format!("line {}: {err}", lineno + 1),
                })?;
            records.push(record);
        }

        Ok((key, records))
    }
}

impl StreamStorage for FsStorage {
    fn append(&self, stream: &str, record: &Record) -> Result<(), StorageError> {
        let _in_process = self
            .write_mutex
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _store = StoreLock::acquire(&self.lock_path(), LOCK_TIMEOUT)?;

        let path = self.stream_path(stream);
        let is_new = !path.exists();

        let line = serde_json::to_string(record).map_err(|err| StorageError::Corrupt {
            stream: stream.to_string(),
            detail: format!("unserializable record: {err}"),
        })?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if is_new {
            file.write_all(Self::header_block(stream).as_bytes())?;
        }
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }

    fn rename(&self, stream: &str, alias: &str) -> Result<(), StorageError> {
        if stream == alias {
            return Ok(());
        }
        let _in_process = self
            .write_mutex
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _store = StoreLock::acquire(&self.lock_path(), LOCK_TIMEOUT)?;

        let src = self.stream_path(stream);
        if !src.exists() {
            return Err(StorageError::MissingStream {
                stream: stream.to_string(),
            });
        }
        let (_, records) = Self::parse_file(&src)?;

        // Rewrite under the new key so the header stays truthful, then swap
        // into place and drop the old file.
        let dst = self.stream_path(alias);
        let tmp = dst.with_extension("stream.tmp");
        let mut content = Self::header_block(alias);
        for record in &records {
            let line = serde_json::to_string(record).map_err(|err| StorageError::Corrupt {
                stream: alias.to_string(),
                detail: format!("unserializable record: {err}"),
            })?;
            content.push_str(&line);
            content.push('\n');
        }
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &dst)?;
        fs::remove_file(&src)?;
        Ok(())
    }

    fn read(&self, stream: &str) -> Result<Option<Vec<Record>>, StorageError> {
        let path = self.stream_path(stream);
        if !path.exists() {
            return Ok(None);
        }
        let (_, records) = Self::parse_file(&path)?;
        Ok(Some(records))
    }

    fn delete(&self, stream: &str) -> Result<(), StorageError> {
        let _in_process = self
            .write_mutex
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _store = StoreLock::acquire(&self.lock_path(), LOCK_TIMEOUT)?;

        let path = self.stream_path(stream);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn most_recent(&self, stream: &str) -> Result<Option<Record>, StorageError> {
        // Full scan; allowed by the contract, adequate at session scale.
        Ok(self
            .read(stream)?
            .and_then(|records| records.into_iter().next_back()))
    }

    fn streams(&self) -> Result<Vec<(String, Vec<Record>)>, StorageError> {
        let mut all = Vec::new();
        for entry in fs::read_dir(self.streams_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("stream") {
                continue;
            }
            let (key, records) = Self::parse_file(&path)?;
            let key = key.ok_or_else(|| StorageError::Corrupt {
                stream: path.display().to_string(),
                detail: "missing key header".to_string(),
            })?;
            all.push((key, records));
        }
        all.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(all)
    }
}
