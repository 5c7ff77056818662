//! Chain verification — the three item invariants, plus tombstone checks.
//!
//! For every item in a stream:
//!
//! 1. **Event binding** — the hash of the item's event payload appears in
//!    its children.
//! 2. **Linkage** — the previous item's hash appears in the children
//!    (skipped for the first item).
//! 3. **Self-consistency** — the stored hash equals the recomputed hash
//!    over (sorted children, timestamp).
//!
//! Verification is read-only and fails on the first violation with the
//! offending item index and the invariant that broke, so an operator can
//! decide whether this is corruption to investigate or a backend bug.

use crate::hash::{self, HashError};
use crate::item::Item;
use crate::tombstone::Tombstone;

/// Which verification invariant failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invariant {
    /// The event payload's hash is missing from the item's children.
    EventBinding,
    /// The previous item's hash is missing from the item's children.
    Linkage,
    /// The stored item hash does not match the recomputed hash.
    HashMismatch,
    /// The tombstone's stored hash does not match its recomputed hash.
    TombstoneHash,
}

impl std::fmt::Display for Invariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::EventBinding => "event binding",
            Self::Linkage => "chain linkage",
            Self::HashMismatch => "hash mismatch",
            Self::TombstoneHash => "tombstone hash mismatch",
        };
        f.write_str(name)
    }
}

/// A failed verification, naming the item and the broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("item {index}: {invariant} — {detail}")]
pub struct IntegrityViolation {
    /// Index of the offending item within the stream (0 for tombstones).
    pub index: usize,
    /// The invariant that failed.
    pub invariant: Invariant,
    /// Human-readable specifics (which hash was expected/missing).
    pub detail: String,
}

fn hash_failure(index: usize, err: &HashError) -> IntegrityViolation {
    IntegrityViolation {
        index,
        invariant: Invariant::HashMismatch,
        detail: format!("hash input rejected: {err}"),
    }
}

/// Verify every item in a stream. Returns the number of items checked.
///
/// Runs in two passes: structural checks first (event binding and linkage
/// against the *stored* predecessor hash), then hash recomputation. A
/// rewritten predecessor hash is therefore reported as the linkage break at
/// its successor — the most diagnostic failure — rather than as a local
/// mismatch at the rewritten item.
///
/// # Errors
///
/// Returns the first [`IntegrityViolation`] encountered, walking
/// front-to-back within each pass.
pub fn verify_items(items: &[Item]) -> Result<usize, IntegrityViolation> {
    let mut previous: Option<&str> = None;
    for (index, item) in items.iter().enumerate() {
        let event_hash =
            hash::event_hash(&item.event).map_err(|err| hash_failure(index, &err))?;
        if !item.children.iter().any(|child| child == &event_hash) {
            return Err(IntegrityViolation {
                index,
                invariant: Invariant::EventBinding,
                detail: format!("event hash {event_hash} not in children"),
            });
        }

        if let Some(prev) = previous
            && !item.children.iter().any(|child| child == prev)
        {
            return Err(IntegrityViolation {
                index,
                invariant: Invariant::Linkage,
                detail: format!("previous hash {prev} not in children"),
            });
        }

        previous = Some(item.hash.as_str());
    }

    for (index, item) in items.iter().enumerate() {
        let expected = hash::item_hash(&item.children, &item.timestamp)
            .map_err(|err| hash_failure(index, &err))?;
        if item.hash != expected {
            return Err(IntegrityViolation {
                index,
                invariant: Invariant::HashMismatch,
                detail: format!("expected {expected}, stored {}", item.hash),
            });
        }
    }

    Ok(items.len())
}

/// Verify a tombstone's own hash commitment.
///
/// # Errors
///
/// Returns [`IntegrityViolation`] with [`Invariant::TombstoneHash`] when the
/// stored hash does not match the recomputed one.
pub fn verify_tombstone(tombstone: &Tombstone) -> Result<(), IntegrityViolation> {
    let expected = tombstone
        .expected_hash()
        .map_err(|err| hash_failure(0, &err))?;
    if tombstone.tombstone_hash != expected {
        return Err(IntegrityViolation {
            index: 0,
            invariant: Invariant::TombstoneHash,
            detail: format!("expected {expected}, stored {}", tombstone.tombstone_hash),
        });
    }
    Ok(())
}
