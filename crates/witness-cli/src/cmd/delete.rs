use std::path::Path;

use clap::Args;
use witness_core::abbrev;

use crate::output::{ABBREV_LEN, OutputMode, print_json};
use crate::store::open_engine;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Stream key to erase (live key or final hash).
    pub key: String,

    /// Why the data is being erased (recorded in the tombstone).
    #[arg(long)]
    pub reason: String,
}

/// Execute `wtn delete`: irreversibly erase a stream, leaving a tombstone.
///
/// # Errors
///
/// Returns an error if the key has no data or deletion fails.
pub fn run_delete(args: &DeleteArgs, output: OutputMode, store_dir: &Path) -> anyhow::Result<()> {
    let engine = open_engine(store_dir)?;
    let tombstone = engine.delete_stream_with_tombstone(&args.key, &args.reason)?;

    if output.is_json() {
        return print_json(&tombstone);
    }

    println!(
        "deleted {} ({} items); tombstone {} left in place",
        args.key,
        tombstone.item_count,
        abbrev(&tombstone.tombstone_hash, ABBREV_LEN)
    );
    Ok(())
}
