//! The Merkle-chained stream engine.
//!
//! Owns the session lifecycle (start → append → close → content-address),
//! parent-stream propagation, chain verification, and tombstone deletion.
//! The engine is a side-effecting tap: callers hand it events, it records
//! them, and it never mutates or consumes a payload.
//!
//! # State machine
//!
//! Per session key: **unopened → open → closed**. Closing renames the stream
//! to its final item's hash (content-addressing), so the key is freed and a
//! closed stream can never be reopened under it. `break_session` is
//! close-then-continue: the new segment's first item carries the closed
//! segment's final hash as an extra child.
//!
//! # Concurrency
//!
//! All calls are synchronous and blocking. A single engine-wide mutex
//! serializes every fetch-previous/append/rename sequence — the coarse
//! baseline the storage contract requires. Stream keys never interleave
//! their read-modify-write steps, so no two items can claim the same
//! previous hash. Propagation to multiple parent streams on close is a
//! sequence of independent appends, not a transaction; a crash mid-way can
//! leave some parents updated and others not.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::clock;
use crate::hash::HashError;
use crate::item::Item;
use crate::session::{Session, parent_key};
use crate::storage::{Record, StorageError, StreamStorage};
use crate::tombstone::{Tombstone, tombstone_key};
use crate::verify::{self, IntegrityViolation};

/// Errors surfaced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `start` was called on a session key that already has unclosed data.
    #[error("session already open: {key}")]
    AlreadyOpen {
        /// The contested session key.
        key: String,
    },

    /// The operation targeted a key with no data and no tombstone.
    #[error("stream not found: {key}")]
    NotFound {
        /// The absent key.
        key: String,
    },

    /// Chain verification failed.
    #[error("integrity violation: {0}")]
    Integrity(#[from] IntegrityViolation),

    /// A hash input was malformed.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// The storage backend failed. The engine performs no retries.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What `verify_chain` found at a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// A live stream whose chain passed all invariants.
    Chain {
        /// Number of items checked.
        items: usize,
    },
    /// The stream was erased; its tombstone's own hash is intact.
    Erased {
        /// How many items the deleted stream had.
        item_count: usize,
        /// The tombstone's integrity hash.
        tombstone_hash: String,
    },
}

/// The stream engine. One instance per store.
pub struct Engine {
    storage: Arc<dyn StreamStorage>,
    categories: BTreeSet<String>,
    // Serializes every fetch-previous + append sequence and rename-on-close.
    write_lock: Mutex<()>,
}

impl Engine {
    /// Create an engine over `storage`.
    ///
    /// `categories` is the set of category names that trigger parent-stream
    /// propagation on close; session categories outside the set are ignored.
    pub fn new<I, S>(storage: Arc<dyn StreamStorage>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            storage,
            categories: categories.into_iter().map(Into::into).collect(),
            write_lock: Mutex::new(()),
        }
    }

    /// The backend this engine writes through.
    #[must_use]
    pub const fn storage(&self) -> &Arc<dyn StreamStorage> {
        &self.storage
    }

    /// The categories that receive parent propagation.
    #[must_use]
    pub const fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- session lifecycle -------------------------------------------------

    /// Open a new session stream (or a continuation segment after a break).
    ///
    /// Appends the initial `start` item — or a `continue` item when
    /// `continuation_hash` links back to a closed segment. Returns the
    /// created item.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyOpen`] if the session key already has
    /// data, or [`EngineError::Storage`] on backend failure.
    pub fn start(
        &self,
        session: &Session,
        metadata: Option<Value>,
        continuation_hash: Option<String>,
    ) -> Result<Item, EngineError> {
        let _guard = self.guard();
        self.start_inner(session, metadata, continuation_hash)
    }

    /// Append `event` to the session's chain and return the persisted item.
    ///
    /// The item's children are the event payload hash, the previous item's
    /// hash when the stream is non-empty, then the caller's `extra_children`
    /// (cross-stream references). The payload is recorded verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on backend failure or
    /// [`EngineError::Hash`] if a hash input is malformed.
    pub fn event_to_session(
        &self,
        event: Value,
        session: &Session,
        extra_children: Vec<String>,
        label: Option<String>,
    ) -> Result<Item, EngineError> {
        let _guard = self.guard();
        self.append_item(&session.key(), event, extra_children, label)
    }

    /// Close the session: append a terminal `close` item, rename the stream
    /// to its final hash, and propagate to parent streams.
    ///
    /// Returns the final hash — the stream's new, content-addressed key.
    /// With `logical_break` set, the rename still happens but parents are
    /// *not* notified: a break is an internal continuation, not session
    /// completion.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the key has no data, or
    /// [`EngineError::Storage`] on backend failure.
    pub fn close_session(
        &self,
        session: &Session,
        logical_break: bool,
    ) -> Result<String, EngineError> {
        let _guard = self.guard();
        self.close_inner(session, logical_break)
    }

    /// Insert a logical break: close the current segment without parent
    /// propagation, then immediately start a continuation segment that
    /// references it. Returns the closed segment's final hash.
    ///
    /// Each segment remains independently verifiable via its own final
    /// hash; the continuation link is auxiliary.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the session has no data, or
    /// [`EngineError::Storage`] on backend failure.
    pub fn break_session(&self, session: &Session) -> Result<String, EngineError> {
        let _guard = self.guard();
        let segment_hash = self.close_inner(session, true)?;
        self.start_inner(session, None, Some(segment_hash.clone()))?;
        Ok(segment_hash)
    }

    // ---- verification ------------------------------------------------------

    /// Verify the integrity of the stream at `key`.
    ///
    /// Lookup order is deterministic: live stream first, then the tombstone
    /// under the reserved derived key — so resolving a deleted stream's
    /// final hash finds evidence of erasure rather than silence. Read-only.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Integrity`] naming the failing item and
    /// invariant, [`EngineError::NotFound`] if neither stream nor tombstone
    /// exists, or [`EngineError::Storage`] on backend failure.
    pub fn verify_chain(&self, key: &str) -> Result<VerifyOutcome, EngineError> {
        if let Some(records) = self.storage.read(key)? {
            let items = items_of(key, &records)?;
            return match verify::verify_items(&items) {
                Ok(count) => Ok(VerifyOutcome::Chain { items: count }),
                Err(violation) => {
                    warn!(key, %violation, "chain verification failed");
                    Err(violation.into())
                }
            };
        }

        let derived = tombstone_key(key);
        if let Some(records) = self.storage.read(&derived)? {
            let tombstone =
                records
                    .first()
                    .and_then(Record::as_tombstone)
                    .ok_or_else(|| StorageError::Corrupt {
                        stream: derived.clone(),
                        detail: "tombstone stream holds no tombstone record".to_string(),
                    })?;
            verify::verify_tombstone(tombstone)?;
            return Ok(VerifyOutcome::Erased {
                item_count: tombstone.item_count,
                tombstone_hash: tombstone.tombstone_hash.clone(),
            });
        }

        Err(EngineError::NotFound {
            key: key.to_string(),
        })
    }

    // ---- deletion ----------------------------------------------------------

    /// Delete a stream's data and leave a tombstone.
    ///
    /// The tombstone preserves the hash skeleton (per-item hashes, final
    /// hash, count) under `__tombstone__<key>`, so parent references stay
    /// resolvable and an auditor can confirm what was erased. Irreversible
    /// and unconditional — permission and legal-basis checks are the
    /// caller's responsibility. Does not cascade.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the key has no data, or
    /// [`EngineError::Storage`] on backend failure.
    pub fn delete_stream_with_tombstone(
        &self,
        key: &str,
        reason: &str,
    ) -> Result<Tombstone, EngineError> {
        let _guard = self.guard();

        let records = self.storage.read(key)?.ok_or_else(|| EngineError::NotFound {
            key: key.to_string(),
        })?;
        let items = items_of(key, &records)?;

        let tombstone = Tombstone::build(key, &items, reason)?;
        self.storage.delete(key)?;
        self.storage
            .append(&tombstone_key(key), &Record::Tombstone(tombstone.clone()))?;

        info!(
            key,
            items = tombstone.item_count,
            reason,
            "stream deleted, tombstone written"
        );
        Ok(tombstone)
    }

    // ---- internals (write lock held by caller) -----------------------------

    fn start_inner(
        &self,
        session: &Session,
        metadata: Option<Value>,
        continuation_hash: Option<String>,
    ) -> Result<Item, EngineError> {
        let key = session.key();
        if self.storage.most_recent(&key)?.is_some() {
            return Err(EngineError::AlreadyOpen { key });
        }

        let mut event = json!({
            "type": "start",
            "session": session.to_value(),
        });
        if let Some(meta) = metadata
            && let Some(map) = event.as_object_mut()
        {
            map.insert("metadata".to_string(), meta);
        }

        let (extras, label) = match continuation_hash {
            Some(hash) => {
                if let Some(map) = event.as_object_mut() {
                    map.insert("type".to_string(), json!("continue"));
                    map.insert("continues".to_string(), json!(hash.clone()));
                }
                (vec![hash], "continue")
            }
            None => (vec![], "start"),
        };

        info!(key, label, "session opened");
        self.append_item(&key, event, extras, Some(label.to_string()))
    }

    fn close_inner(
        &self,
        session: &Session,
        logical_break: bool,
    ) -> Result<String, EngineError> {
        let key = session.key();
        if self.storage.most_recent(&key)?.is_none() {
            return Err(EngineError::NotFound { key });
        }

        self.append_item(
            &key,
            json!({"type": "close", "session": session.to_value()}),
            vec![],
            Some("close".to_string()),
        )?;

        // Read back and take the last item's hash as the stream's final
        // commitment, then content-address the stream under it.
        let records = self.storage.read(&key)?.ok_or_else(|| EngineError::NotFound {
            key: key.clone(),
        })?;
        let items = items_of(&key, &records)?;
        let final_hash = items
            .last()
            .map(|item| item.hash.clone())
            .ok_or_else(|| EngineError::NotFound { key: key.clone() })?;
        self.storage.rename(&key, &final_hash)?;

        info!(key, final_hash, logical_break, "session closed");

        if logical_break {
            return Ok(final_hash);
        }

        // Propagate a tamper-evident pointer to every parent stream. These
        // are independent appends; a crash mid-way leaves partial
        // propagation (accepted limitation, not hidden).
        for (category, value) in session.pairs() {
            if !self.categories.contains(category) {
                continue;
            }
            self.append_item(
                &parent_key(category, value),
                json!({
                    "type": "child_session_finished",
                    "child_hash": final_hash,
                    "child_session": session.to_value(),
                }),
                vec![final_hash.clone()],
                Some(format!("{category}:{value}")),
            )?;
        }

        Ok(final_hash)
    }

    fn append_item(
        &self,
        key: &str,
        event: Value,
        extra_children: Vec<String>,
        label: Option<String>,
    ) -> Result<Item, EngineError> {
        let previous = match self.storage.most_recent(key)? {
            Some(Record::Item(item)) => Some(item.hash),
            Some(Record::Tombstone(_)) => {
                return Err(StorageError::Corrupt {
                    stream: key.to_string(),
                    detail: "tombstone record in live stream".to_string(),
                }
                .into());
            }
            None => None,
        };

        let item = Item::build(
            event,
            extra_children,
            previous,
            clock::now_iso(),
            label,
        )?;
        self.storage.append(key, &Record::Item(item.clone()))?;
        debug!(key, hash = %item.hash, "item appended");
        Ok(item)
    }
}

/// Interpret a live stream's records as items; a tombstone among them means
/// the backend handed back a corrupt stream.
fn items_of(key: &str, records: &[Record]) -> Result<Vec<Item>, EngineError> {
    records
        .iter()
        .map(|record| {
            record.as_item().cloned().ok_or_else(|| {
                StorageError::Corrupt {
                    stream: key.to_string(),
                    detail: "tombstone record in live stream".to_string(),
                }
                .into()
            })
        })
        .collect()
}
