//! The item record — one entry in a stream.
//!
//! Each item commits to its event payload (via the payload's content hash),
//! to its predecessor (via the previous item's hash), and to its creation
//! time. Because every item's hash covers its children, the final item's
//! hash is a commitment to the entire stream: modifying, inserting, or
//! removing any earlier item changes every later hash.
//!
//! # Persisted shape
//!
//! ```json
//! {"hash":"<hex>","children":["<hex>",...],"timestamp":"<iso-8601>",
//!  "event":{...},"label":"..."}
//! ```
//!
//! `children` preserves author order: the event hash first, then the
//! previous item's hash, then caller-supplied extra references. Sorting
//! happens only inside the hash computation. `label` is cosmetic and not
//! part of the hash input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hash::{self, HashError};

/// A single entry in a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Lowercase hex SHA-256 over (sorted children, timestamp).
    pub hash: String,

    /// Hashes this item depends on, in author order.
    ///
    /// Always contains the event payload hash; contains the previous item's
    /// hash for every item after the first; may contain extra
    /// cross-references (continuation links, child-session links).
    pub children: Vec<String>,

    /// Creation time, ISO-8601 UTC. Part of the hash input.
    pub timestamp: String,

    /// Arbitrary structured payload. Opaque to the engine beyond canonical
    /// serialization.
    pub event: Value,

    /// Optional human-readable annotation. Not hashed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Item {
    /// Build an item for `event`, chaining to `previous_hash` when present.
    ///
    /// Children are assembled in author order (event hash, previous hash,
    /// extras) and the item hash is computed over the sorted children plus
    /// the timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if any hash input contains a literal tab.
    pub fn build(
        event: Value,
        extra_children: Vec<String>,
        previous_hash: Option<String>,
        timestamp: String,
        label: Option<String>,
    ) -> Result<Self, HashError> {
        let mut children = vec![hash::event_hash(&event)?];
        if let Some(prev) = previous_hash {
            children.push(prev);
        }
        children.extend(extra_children);
        let item_hash = hash::item_hash(&children, &timestamp)?;

        Ok(Self {
            hash: item_hash,
            children,
            timestamp,
            event,
            label,
        })
    }

    /// The `type` field of the event payload, if the payload is an object
    /// with a string `type`.
    ///
    /// Lifecycle items authored by the engine (`start`, `continue`, `close`,
    /// `child_session_finished`) always have one; caller payloads may not.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.event.get("type").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{event_hash, item_hash};
    use serde_json::json;

    const TS: &str = "2026-01-15T08:30:00.000000Z";

    #[test]
    fn build_children_author_order() {
        let event = json!({"type": "keystroke", "key": "a"});
        let item = Item::build(
            event.clone(),
            vec!["extra-ref".to_string()],
            Some("prev-hash".to_string()),
            TS.to_string(),
            None,
        )
        .expect("build");

        let ehash = event_hash(&event).expect("hash");
        assert_eq!(
            item.children,
            vec![ehash, "prev-hash".to_string(), "extra-ref".to_string()]
        );
    }

    #[test]
    fn build_without_previous() {
        let event = json!({"type": "start"});
        let item = Item::build(event.clone(), vec![], None, TS.to_string(), None).expect("build");
        assert_eq!(item.children, vec![event_hash(&event).expect("hash")]);
    }

    #[test]
    fn hash_matches_protocol() {
        let event = json!({"type": "submit"});
        let item = Item::build(
            event,
            vec![],
            Some("prev".to_string()),
            TS.to_string(),
            None,
        )
        .expect("build");
        let expected = item_hash(&item.children, &item.timestamp).expect("hash");
        assert_eq!(item.hash, expected);
    }

    #[test]
    fn label_does_not_affect_hash() {
        let event = json!({"type": "submit"});
        let plain = Item::build(event.clone(), vec![], None, TS.to_string(), None).expect("build");
        let labeled = Item::build(
            event,
            vec![],
            None,
            TS.to_string(),
            Some("submit".to_string()),
        )
        .expect("build");
        assert_eq!(plain.hash, labeled.hash);
    }

    #[test]
    fn serde_shape_omits_absent_label() {
        let item = Item::build(json!({"k": 1}), vec![], None, TS.to_string(), None).expect("build");
        let text = serde_json::to_string(&item).expect("serialize");
        assert!(!text.contains("label"));

        let back: Item = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(item, back);
    }

    #[test]
    fn event_type_helper() {
        let item = Item::build(
            json!({"type": "close", "session": {}}),
            vec![],
            None,
            TS.to_string(),
            None,
        )
        .expect("build");
        assert_eq!(item.event_type(), Some("close"));

        let opaque =
            Item::build(json!([1, 2, 3]), vec![], None, TS.to_string(), None).expect("build");
        assert_eq!(opaque.event_type(), None);
    }
}
