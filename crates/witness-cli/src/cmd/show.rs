use std::path::Path;

use clap::Args;
use serde_json::json;
use witness_core::{Resolved, abbrev, resolve};

use crate::output::{ABBREV_LEN, OutputMode, print_json};
use crate::store::open_engine;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Stream key: a live session key, a final hash, or a parent key.
    pub key: String,
}

/// Execute `wtn show`: print the contents of one stream.
///
/// # Errors
///
/// Returns an error if the key resolves to nothing.
pub fn run_show(args: &ShowArgs, output: OutputMode, store_dir: &Path) -> anyhow::Result<()> {
    let engine = open_engine(store_dir)?;

    match resolve(engine.storage().as_ref(), &args.key)? {
        Resolved::Stream(items) => {
            if output.is_json() {
                return print_json(&items);
            }
            println!("stream {} ({} items)", args.key, items.len());
            for (index, item) in items.iter().enumerate() {
                let label = item
                    .label
                    .as_deref()
                    .or_else(|| item.event_type())
                    .unwrap_or("event");
                println!(
                    "  [{index}] {}  {}  {label}",
                    abbrev(&item.hash, ABBREV_LEN),
                    item.timestamp
                );
            }
            Ok(())
        }
        Resolved::Tombstone(tombstone) => {
            if output.is_json() {
                return print_json(&tombstone);
            }
            println!("tombstone for {}", tombstone.deleted_stream);
            println!("  deleted:  {} items", tombstone.item_count);
            println!("  final:    {}", abbrev(&tombstone.final_hash, ABBREV_LEN));
            println!("  reason:   {}", tombstone.reason);
            println!("  at:       {}", tombstone.timestamp);
            Ok(())
        }
        Resolved::Absent => {
            if output.is_json() {
                print_json(&json!({"key": args.key, "status": "absent"}))?;
            }
            anyhow::bail!("nothing stored under {:?}", args.key)
        }
    }
}
