//! SHA-256 digests over canonical bytes.
//!
//! Every hash in the store is a lowercase hex SHA-256 digest of tab-joined
//! input strings. Tabs are forbidden *inside* any input so that the joined
//! form is unambiguous — `digest(["a", "b"])` can never collide with
//! `digest(["a\tb"])`.
//!
//! Item hashes commit to the item's children (sorted, so hash order does not
//! depend on insertion order) and its timestamp. Event hashes commit to the
//! canonical serialization of the payload.
//!
//! Hashes are always stored and compared at full length. [`abbrev`] exists
//! for display only (logs, CLI output) and is never security-relevant.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical::canonical_json;

/// Errors from digest computation.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// An input string contained a literal tab, which would make the
    /// tab-joined digest input ambiguous.
    #[error("digest input contains a literal tab: {0:?}")]
    TabInInput(String),
}

/// Compute the SHA-256 hex digest of tab-joined input strings.
///
/// # Errors
///
/// Returns [`HashError::TabInInput`] if any part contains a tab character.
pub fn digest(parts: &[&str]) -> Result<String, HashError> {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if part.contains('\t') {
            return Err(HashError::TabInInput((*part).to_string()));
        }
        if i > 0 {
            hasher.update(b"\t");
        }
        hasher.update(part.as_bytes());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compute an item hash from its children and timestamp.
///
/// Children are sorted lexicographically before hashing, so the result
/// depends only on set membership, not on author order.
///
/// # Errors
///
/// Returns [`HashError::TabInInput`] if any child or the timestamp contains
/// a tab.
pub fn item_hash(children: &[String], timestamp: &str) -> Result<String, HashError> {
    let mut sorted: Vec<&str> = children.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.push(timestamp);
    digest(&sorted)
}

/// Compute the content hash of an event payload.
///
/// The payload is canonicalized first, so two semantically identical values
/// always hash identically.
///
/// # Errors
///
/// Returns [`HashError`] if the canonical form contains a tab — impossible
/// in practice, since canonical JSON escapes tabs as `\t`.
pub fn event_hash(event: &Value) -> Result<String, HashError> {
    digest(&[&canonical_json(event)])
}

/// Shorten a hash for human-readable display.
///
/// Returns the first `len` characters, or the whole string if shorter.
/// Display-only: stored and compared hashes are always full digests.
#[must_use]
pub fn abbrev(hash: &str, len: usize) -> &str {
    let end = hash
        .char_indices()
        .nth(len)
        .map_or(hash.len(), |(idx, _)| idx);
    &hash[..end]
}
