//! In-memory storage backend.
//!
//! A map of stream key → record list behind one coarse mutex. Suitable for
//! tests and short-lived pipelines; all data is lost when the process exits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Record, StorageError, StreamStorage};

/// Dict-of-lists backend with coarse locking.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    streams: Mutex<HashMap<String, Vec<Record>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, Vec<Record>>> {
        // A poisoned mutex means a writer panicked mid-operation; the map
        // itself is still structurally sound, so recover the guard.
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StreamStorage for MemoryStorage {
    fn append(&self, stream: &str, record: &Record) -> Result<(), StorageError> {
        self.guard()
            .entry(stream.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn rename(&self, stream: &str, alias: &str) -> Result<(), StorageError> {
        if stream == alias {
            return Ok(());
        }
        let mut streams = self.guard();
        let records = streams
            .remove(stream)
            .ok_or_else(|| StorageError::MissingStream {
                stream: stream.to_string(),
            })?;
        streams.insert(alias.to_string(), records);
        Ok(())
    }

    fn read(&self, stream: &str) -> Result<Option<Vec<Record>>, StorageError> {
        Ok(self.guard().get(stream).cloned())
    }

    fn delete(&self, stream: &str) -> Result<(), StorageError> {
        self.guard().remove(stream);
        Ok(())
    }

    fn most_recent(&self, stream: &str) -> Result<Option<Record>, StorageError> {
        Ok(self
            .guard()
            .get(stream)
            .and_then(|records| records.last())
            .cloned())
    }

    fn streams(&self) -> Result<Vec<(String, Vec<Record>)>, StorageError> {
        let mut all: Vec<(String, Vec<Record>)> = self
            .guard()
            .iter()
            .map(|(key, records)| (key.clone(), records.clone()))
            .collect();
        all.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use serde_json::json;

    fn record(payload: &str) -> Record {
        Record::from(
            Item::build(
                json!({"type": "event", "payload": payload}),
                vec![],
                None,
                "2026-01-15T08:30:00.000000Z".to_string(),
                None,
            )
            .expect("build"),
        )
    }

    #[test]
    fn append_creates_and_extends() {
        let store = MemoryStorage::new();
        store.append("s", &record("a")).expect("append");
        store.append("s", &record("b")).expect("append");
        let records = store.read("s").expect("read").expect("present");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn read_absent_is_none() {
        let store = MemoryStorage::new();
        assert!(store.read("missing").expect("read").is_none());
    }

    #[test]
    fn rename_moves_stream() {
        let store = MemoryStorage::new();
        store.append("old", &record("a")).expect("append");
        store.rename("old", "new").expect("rename");
        assert!(store.read("old").expect("read").is_none());
        assert!(store.read("new").expect("read").is_some());
    }

    #[test]
    fn rename_to_self_is_noop() {
        let store = MemoryStorage::new();
        store.append("s", &record("a")).expect("append");
        store.rename("s", "s").expect("rename");
        assert_eq!(store.read("s").expect("read").expect("present").len(), 1);
    }

    #[test]
    fn rename_missing_errors() {
        let store = MemoryStorage::new();
        let err = store.rename("missing", "new").expect_err("must fail");
        assert!(matches!(err, StorageError::MissingStream { .. }));
    }

    #[test]
    fn delete_makes_absent() {
        let store = MemoryStorage::new();
        store.append("s", &record("a")).expect("append");
        store.delete("s").expect("delete");
        assert!(store.read("s").expect("read").is_none());
        // Deleting again is a no-op.
        store.delete("s").expect("delete");
    }

    #[test]
    fn most_recent_is_last_append() {
        let store = MemoryStorage::new();
        assert!(store.most_recent("s").expect("recent").is_none());
        store.append("s", &record("a")).expect("append");
        let last = record("b");
        store.append("s", &last).expect("append");
        assert_eq!(store.most_recent("s").expect("recent"), Some(last));
    }

    #[test]
    fn streams_enumerates_sorted() {
        let store = MemoryStorage::new();
        store.append("b", &record("1")).expect("append");
        store.append("a", &record("2")).expect("append");
        let all = store.streams().expect("streams");
        let keys: Vec<&str> = all.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
