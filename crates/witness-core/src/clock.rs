//! UTC timestamps for item and tombstone records.
//!
//! Timestamps are ISO-8601 with fixed-width microsecond precision, so string
//! ordering agrees with chronological ordering. The timestamp is part of
//! every item's hash input, which prevents replaying the same event at a
//! different time without changing the hash.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as a sortable ISO-8601 string.
///
/// e.g. `"2026-01-15T08:30:00.123456Z"`.
#[must_use]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
