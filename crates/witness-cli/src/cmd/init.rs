use std::fs;
use std::path::Path;

use anyhow::Context as _;
use clap::Args;
use serde_json::json;
use witness_core::{FsStorage, StoreConfig};

use crate::output::{OutputMode, print_json};
use crate::store::CONFIG_FILE;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Re-initialize even if the store directory already exists.
    #[arg(long)]
    pub force: bool,
}

/// Execute `wtn init`: create the store directory, a default `store.toml`,
/// and the backend's layout.
///
/// # Errors
///
/// Returns an error if the store already exists without `--force`, or on
/// filesystem failure.
pub fn run_init(args: &InitArgs, output: OutputMode, store_dir: &Path) -> anyhow::Result<()> {
    let config_path = store_dir.join(CONFIG_FILE);
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "store already initialized at {} (use --force to reinitialize)",
            store_dir.display()
        );
    }

    fs::create_dir_all(store_dir)
        .with_context(|| format!("creating {}", store_dir.display()))?;

    let config = StoreConfig {
        root: Some(store_dir.to_path_buf()),
        ..StoreConfig::default()
    };
    fs::write(&config_path, toml::to_string_pretty(&config)?)
        .with_context(|| format!("writing {}", config_path.display()))?;

    // Lay out the backend's directories up front so the first append does
    // not race with another process doing the same.
    FsStorage::open(store_dir)?;

    if output.is_json() {
        return print_json(&json!({
            "store": store_dir.display().to_string(),
            "backend": config.backend,
            "categories": config.categories,
        }));
    }

    println!("Initialized store at {}", store_dir.display());
    println!("  backend:    {}", config.backend);
    println!("  categories: {}", config.categories.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_config_and_layout() {
        let tmp = TempDir::new().expect("tmp");
        let store = tmp.path().join("store");
        run_init(&InitArgs { force: false }, OutputMode::Human, &store).expect("init");

        assert!(store.join(CONFIG_FILE).is_file());
        assert!(store.join("streams").is_dir());
    }

    #[test]
    fn reinit_requires_force() {
        let tmp = TempDir::new().expect("tmp");
        let store = tmp.path().join("store");
        run_init(&InitArgs { force: false }, OutputMode::Human, &store).expect("init");

        assert!(run_init(&InitArgs { force: false }, OutputMode::Human, &store).is_err());
        run_init(&InitArgs { force: true }, OutputMode::Human, &store).expect("reinit");
    }
}
