use std::path::Path;

use clap::Args;
use serde::Serialize;
use witness_core::{Record, StreamStorage as _};

use crate::output::{OutputMode, print_json};
use crate::store::open_engine;

#[derive(Args, Debug)]
pub struct LsArgs {
    /// Include tombstone streams in the listing.
    #[arg(long)]
    pub all: bool,
}

#[derive(Serialize)]
struct StreamRow {
    key: String,
    kind: &'static str,
    records: usize,
}

/// Execute `wtn ls`: enumerate every stream in the store.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read.
pub fn run_ls(args: &LsArgs, output: OutputMode, store_dir: &Path) -> anyhow::Result<()> {
    let engine = open_engine(store_dir)?;
    let rows: Vec<StreamRow> = engine
        .storage()
        .streams()?
        .into_iter()
        .map(|(key, records)| {
            let kind = match records.first() {
                Some(Record::Tombstone(_)) => "tombstone",
                _ => "stream",
            };
            StreamRow {
                key,
                kind,
                records: records.len(),
            }
        })
        .filter(|row| args.all || row.kind != "tombstone")
        .collect();

    if output.is_json() {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("(empty store)");
        return Ok(());
    }
    for row in rows {
        println!("{:<9} {:>5}  {}", row.kind, row.records, row.key);
    }
    Ok(())
}
