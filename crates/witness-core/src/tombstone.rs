//! Tombstone records for irreversible-but-auditable deletion.
//!
//! Deleting a stream removes its event data but leaves a tombstone that
//! preserves the hash skeleton: the deleted key, the final hash, and the
//! ordered list of per-item hashes. Parent streams that reference the final
//! hash remain structurally valid — resolving the hash finds the tombstone
//! instead of the data — and an auditor can always distinguish "never
//! existed" from "existed and was erased".
//!
//! Tombstones are stored under `__tombstone__<stream_key>`. The reserved
//! prefix cannot collide with real stream keys: session and parent keys are
//! JSON objects (start with `{`) and content-addressed keys are bare hex.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_json;
use crate::clock;
use crate::hash::{self, HashError};
use crate::item::Item;

/// Reserved key prefix for tombstone streams.
pub const TOMBSTONE_PREFIX: &str = "__tombstone__";

/// The storage key a tombstone for `stream_key` is persisted under.
#[must_use]
pub fn tombstone_key(stream_key: &str) -> String {
    format!("{TOMBSTONE_PREFIX}{stream_key}")
}

/// The record left in place of a deleted stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    /// Always `"tombstone"`; distinguishes this record from items on the
    /// storage surface.
    #[serde(rename = "type")]
    pub kind: String,

    /// The stream key that was deleted (session key or final hash).
    pub deleted_stream: String,

    /// The deleted stream's final item hash.
    pub final_hash: String,

    /// Ordered per-item hashes — the content-free skeleton of what was
    /// deleted.
    pub item_hashes: Vec<String>,

    /// Number of deleted items. Always `item_hashes.len()`.
    pub item_count: usize,

    /// Human-readable deletion reason, e.g. an erasure-request reference.
    pub reason: String,

    /// When the deletion happened, ISO-8601 UTC.
    pub timestamp: String,

    /// SHA-256 over the canonical serialization of every other field —
    /// the tombstone's own integrity commitment.
    pub tombstone_hash: String,
}

impl Tombstone {
    /// Build a tombstone for a stream about to be deleted.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the canonical serialization contains a
    /// literal tab (impossible for well-formed records).
    pub fn build(deleted_stream: &str, items: &[Item], reason: &str) -> Result<Self, HashError> {
        let item_hashes: Vec<String> = items.iter().map(|item| item.hash.clone()).collect();
        let final_hash = item_hashes.last().cloned().unwrap_or_default();

        let mut tombstone = Self {
            kind: "tombstone".to_string(),
            deleted_stream: deleted_stream.to_string(),
            final_hash,
            item_count: item_hashes.len(),
            item_hashes,
            reason: reason.to_string(),
            timestamp: clock::now_iso(),
            tombstone_hash: String::new(),
        };
        tombstone.tombstone_hash = tombstone.expected_hash()?;
        Ok(tombstone)
    }

    /// Recompute the hash this tombstone should carry.
    ///
    /// Covers every field except `tombstone_hash` itself, canonically
    /// serialized. Used both at construction and by verification.
    ///
    /// # Panics
    ///
    /// If the tombstone cannot be serialized to JSON, which cannot happen
    /// for this struct.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the canonical serialization contains a
    /// literal tab.
    pub fn expected_hash(&self) -> Result<String, HashError> {
        let mut value =
            serde_json::to_value(self).expect("tombstone serialization cannot fail");
        if let Some(map) = value.as_object_mut() {
            map.remove("tombstone_hash");
        }
        hash::digest(&[&canonical_json(&value)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_items() -> Vec<Item> {
        ["a", "b", "c"]
            .iter()
            .map(|key| {
                Item::build(
                    json!({"type": "event", "payload": key}),
                    vec![],
                    None,
                    "2026-01-15T08:30:00.000000Z".to_string(),
                    None,
                )
                .expect("build")
            })
            .collect()
    }

    #[test]
    fn key_uses_reserved_prefix() {
        let key = tombstone_key("deadbeef");
        assert_eq!(key, "__tombstone__deadbeef");
        assert!(key.starts_with(TOMBSTONE_PREFIX));
    }

    #[test]
    fn build_captures_skeleton() {
        let items = sample_items();
        let tombstone =
            Tombstone::build("deadbeef", &items, "erasure request #42").expect("build");

        assert_eq!(tombstone.kind, "tombstone");
        assert_eq!(tombstone.deleted_stream, "deadbeef");
        assert_eq!(tombstone.item_count, 3);
        assert_eq!(tombstone.item_hashes.len(), 3);
        assert_eq!(tombstone.final_hash, items[2].hash);
        assert_eq!(tombstone.reason, "erasure request #42");
    }

    #[test]
    fn hash_is_self_consistent() {
        let tombstone = Tombstone::build("k", &sample_items(), "r").expect("build");
        assert_eq!(
            tombstone.tombstone_hash,
            tombstone.expected_hash().expect("hash")
        );
    }

    #[test]
    fn tampering_breaks_hash() {
        let mut tombstone = Tombstone::build("k", &sample_items(), "r").expect("build");
        tombstone.reason = "a different reason".to_string();
        assert_ne!(
            tombstone.tombstone_hash,
            tombstone.expected_hash().expect("hash")
        );
    }

    #[test]
    fn serde_roundtrip_with_type_field() {
        let tombstone = Tombstone::build("k", &sample_items(), "r").expect("build");
        let text = serde_json::to_string(&tombstone).expect("serialize");
        assert!(text.contains("\"type\":\"tombstone\""));
        let back: Tombstone = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(tombstone, back);
    }
}
