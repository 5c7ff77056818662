//! Storage backends for named streams.
//!
//! A stream is an ordered list of records under a string key. The engine
//! only ever appends, renames (content-addressing on close), reads, and
//! deletes whole streams; backends own physical persistence and must not
//! interpret hash semantics.
//!
//! Contract:
//! - `append` is all-or-nothing and creates the stream if absent.
//! - `read` of an absent stream is `Ok(None)`; existing-but-empty streams
//!   read as `Ok(Some(vec![]))`.
//! - `rename` onto the same key is a no-op; the source must exist.
//! - After `delete`, `read` reports absent.
//! - All mutating operations are serialized by the backend (coarse lock is
//!   the accepted baseline); the engine additionally serializes its own
//!   read-modify-write sequences.
//! - I/O failures surface as [`StorageError`]; backends do not retry.

pub mod fs;
pub mod lock;
pub mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use serde::{Deserialize, Serialize};

use crate::item::Item;
use crate::tombstone::Tombstone;

/// Errors surfaced by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O failure in a filesystem-backed store.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Advisory lock acquisition failed.
    #[error("storage lock error: {0}")]
    Lock(#[from] lock::LockError),

    /// A rename targeted a stream that does not exist.
    #[error("stream not present in storage: {stream:?}")]
    MissingStream {
        /// The absent stream key.
        stream: String,
    },

    /// Persisted data could not be parsed back into records.
    #[error("corrupt stream {stream:?}: {detail}")]
    Corrupt {
        /// The stream key whose data is unreadable.
        stream: String,
        /// What failed to parse.
        detail: String,
    },
}

/// One persisted record: a chain item or a tombstone.
///
/// Untagged union — tombstones carry `deleted_stream`/`tombstone_hash`
/// fields that items never have, so deserialization is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    /// A tombstone left by deletion.
    Tombstone(Tombstone),
    /// An ordinary chain item.
    Item(Item),
}

impl Record {
    /// Borrow the inner item, if this record is one.
    #[must_use]
    pub const fn as_item(&self) -> Option<&Item> {
        match self {
            Self::Item(item) => Some(item),
            Self::Tombstone(_) => None,
        }
    }

    /// Borrow the inner tombstone, if this record is one.
    #[must_use]
    pub const fn as_tombstone(&self) -> Option<&Tombstone> {
        match self {
            Self::Tombstone(tombstone) => Some(tombstone),
            Self::Item(_) => None,
        }
    }
}

impl From<Item> for Record {
    fn from(item: Item) -> Self {
        Self::Item(item)
    }
}

impl From<Tombstone> for Record {
    fn from(tombstone: Tombstone) -> Self {
        Self::Tombstone(tombstone)
    }
}

/// Abstract contract every stream backend must satisfy.
///
/// Conforming implementations (in-memory map, one-file-per-stream, a
/// message-log-backed store) are pluggable without engine changes.
pub trait StreamStorage: std::fmt::Debug + Send + Sync {
    /// Durably append one record to the end of `stream`, creating the
    /// stream if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the record cannot be persisted. Each
    /// append is atomic from the engine's perspective.
    fn append(&self, stream: &str, record: &Record) -> Result<(), StorageError>;

    /// Atomically make `alias` resolve to the stream previously under
    /// `stream`. No-op when the keys are equal.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingStream`] if the source is absent.
    fn rename(&self, stream: &str, alias: &str) -> Result<(), StorageError>;

    /// Read all records in `stream`, or `None` if the stream is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on I/O failure or unparseable data.
    fn read(&self, stream: &str) -> Result<Option<Vec<Record>>, StorageError>;

    /// Physically remove `stream` and all its records. No-op if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on I/O failure.
    fn delete(&self, stream: &str) -> Result<(), StorageError>;

    /// The last record in `stream`, or `None` if empty or absent.
    ///
    /// Used to fetch the previous-item hash for chaining. Backends may
    /// implement this by full scan; that is allowed but non-ideal.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on I/O failure.
    fn most_recent(&self, stream: &str) -> Result<Option<Record>, StorageError>;

    /// Every `(stream_key, records)` pair in the store.
    ///
    /// Used by auditing tooling; not performance-critical.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on I/O failure.
    fn streams(&self) -> Result<Vec<(String, Vec<Record>)>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_discriminates_item_from_tombstone() {
        let item = Item::build(
            json!({"type": "event"}),
            vec![],
            None,
            "2026-01-15T08:30:00.000000Z".to_string(),
            None,
        )
        .expect("build");
        let tombstone = Tombstone::build("key", std::slice::from_ref(&item), "r").expect("build");

        let item_json = serde_json::to_string(&Record::from(item.clone())).expect("serialize");
        let tomb_json =
            serde_json::to_string(&Record::from(tombstone.clone())).expect("serialize");

        let item_back: Record = serde_json::from_str(&item_json).expect("deserialize");
        let tomb_back: Record = serde_json::from_str(&tomb_json).expect("deserialize");

        assert_eq!(item_back.as_item(), Some(&item));
        assert_eq!(tomb_back.as_tombstone(), Some(&tombstone));
    }
}
