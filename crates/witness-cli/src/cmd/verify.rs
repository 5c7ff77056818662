use std::path::Path;

use clap::Args;
use serde_json::json;
use witness_core::{EngineError, VerifyOutcome, abbrev};

use crate::output::{ABBREV_LEN, OutputMode, print_json};
use crate::store::open_engine;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Stream key to verify (live key or final hash).
    pub key: String,
}

/// Execute `wtn verify`: check every chain invariant of one stream.
///
/// # Errors
///
/// Returns an error naming the offending item and invariant when the chain
/// does not verify, or when the key resolves to nothing.
pub fn run_verify(args: &VerifyArgs, output: OutputMode, store_dir: &Path) -> anyhow::Result<()> {
    let engine = open_engine(store_dir)?;

    match engine.verify_chain(&args.key) {
        Ok(VerifyOutcome::Chain { items }) => {
            if output.is_json() {
                return print_json(&json!({
                    "key": args.key,
                    "status": "ok",
                    "items": items,
                }));
            }
            println!("ok: chain of {items} items verified");
            Ok(())
        }
        Ok(VerifyOutcome::Erased {
            item_count,
            tombstone_hash,
        }) => {
            if output.is_json() {
                return print_json(&json!({
                    "key": args.key,
                    "status": "erased",
                    "item_count": item_count,
                    "tombstone_hash": tombstone_hash,
                }));
            }
            println!(
                "ok: erased ({item_count} items deleted, tombstone {} intact)",
                abbrev(&tombstone_hash, ABBREV_LEN)
            );
            Ok(())
        }
        Err(EngineError::Integrity(violation)) => {
            if output.is_json() {
                print_json(&json!({
                    "key": args.key,
                    "status": "violation",
                    "item": violation.index,
                    "invariant": violation.invariant.to_string(),
                    "detail": violation.detail,
                }))?;
            }
            anyhow::bail!("verification failed: {violation}")
        }
        Err(err) => Err(err.into()),
    }
}
