use std::path::Path;

use clap::Args;
use serde_json::json;
use witness_core::finished_sessions;

use crate::output::{OutputMode, print_json};
use crate::store::open_engine;

#[derive(Args, Debug)]
pub struct SessionsArgs {
    /// Category name, e.g. `student`.
    pub category: String,

    /// Category value, e.g. a student identifier.
    pub value: String,
}

/// Execute `wtn sessions`: list the finished sessions recorded under one
/// (category, value) pair of the parent index.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read.
pub fn run_sessions(
    args: &SessionsArgs,
    output: OutputMode,
    store_dir: &Path,
) -> anyhow::Result<()> {
    let engine = open_engine(store_dir)?;
    let hashes = finished_sessions(engine.storage().as_ref(), &args.category, &args.value)?;

    if output.is_json() {
        return print_json(&json!({
            "category": args.category,
            "value": args.value,
            "sessions": hashes,
        }));
    }

    if hashes.is_empty() {
        println!("no finished sessions for {}:{}", args.category, args.value);
        return Ok(());
    }
    for hash in hashes {
        println!("{hash}");
    }
    Ok(())
}
