//! Session descriptors and stream keys.
//!
//! A session descriptor maps category names to one or more values, e.g.
//! `{"student": ["Alice"], "tool": ["editor"]}`. Its canonical JSON
//! serialization is the *session key* — the stream name a live session is
//! written under until it is closed and renamed to its final content hash.
//!
//! Each (category, value) pair also names a *parent stream*, keyed by the
//! canonical JSON of a single-entry object with a scalar value, e.g.
//! `{"student":"Alice"}`. Parent streams are long-lived and receive a
//! `child_session_finished` item whenever a session containing that pair
//! closes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::canonical::canonical_json;

/// A session descriptor: category name → list of values.
///
/// Backed by a `BTreeMap`, so iteration (and thus parent propagation order)
/// is deterministic regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(BTreeMap<String, Vec<String>>);

impl Session {
    /// Create an empty descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of a category with a single value.
    #[must_use]
    pub fn with(mut self, category: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.entry(category.into()).or_default().push(value.into());
        self
    }

    /// Builder-style insertion of a category with multiple values.
    #[must_use]
    pub fn with_values<I, S>(mut self, category: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(category.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// The stream key for the live session: canonical JSON of the descriptor.
    ///
    /// Two calls with the same logical descriptor always map to the same
    /// stream; distinct descriptors never collide.
    #[must_use]
    pub fn key(&self) -> String {
        canonical_json(&self.to_value())
    }

    /// The descriptor as a JSON value (values as lists).
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!(self.0)
    }

    /// Iterate over every (category, value) pair, flattened.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(category, values)| {
            values
                .iter()
                .map(move |value| (category.as_str(), value.as_str()))
        })
    }

    /// True if the descriptor has no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The stream key of the parent stream for one (category, value) pair.
///
/// Note the scalar value — `{"student":"Alice"}`, not
/// `{"student":["Alice"]}` — so parent keys can never collide with session
/// keys, whose values are always lists.
#[must_use]
pub fn parent_key(category: &str, value: &str) -> String {
    canonical_json(&json!({ category: value }))
}
