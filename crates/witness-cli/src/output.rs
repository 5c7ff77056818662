//! Output layer: human text or stable JSON, per command.
//!
//! Every command handler receives an [`OutputMode`] and keeps its two
//! renderings in parity — whatever a human can read off the terminal, a
//! script can read off `--json`.

use serde::Serialize;

/// Display length for abbreviated hashes in human output.
pub const ABBREV_LEN: usize = 12;

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON, one object or array per command.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Print `value` as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
