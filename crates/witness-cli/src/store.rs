//! Opening a store from a directory.
//!
//! A store directory holds an optional `store.toml` plus the backend's
//! files. The CLI reads the config (defaults apply when the file is
//! absent), forces the root to the store directory, and builds the engine
//! through the backend registry.

use std::path::Path;

use anyhow::Context as _;
use witness_core::{BackendRegistry, Engine, StoreConfig};

/// Name of the config file inside a store directory.
pub const CONFIG_FILE: &str = "store.toml";

/// Load the store config, applying defaults when `store.toml` is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(store_dir: &Path) -> anyhow::Result<StoreConfig> {
    let path = store_dir.join(CONFIG_FILE);
    let mut config = if path.exists() {
        StoreConfig::load(&path)
            .with_context(|| format!("loading {}", path.display()))?
    } else {
        StoreConfig::default()
    };
    if config.root.is_none() {
        config.root = Some(store_dir.to_path_buf());
    }
    Ok(config)
}

/// Open the engine for a store directory.
///
/// # Errors
///
/// Returns an error if the store does not exist or the backend cannot be
/// constructed.
pub fn open_engine(store_dir: &Path) -> anyhow::Result<Engine> {
    anyhow::ensure!(
        store_dir.is_dir(),
        "no store at {} (run `wtn init` first)",
        store_dir.display()
    );
    let config = load_config(store_dir)?;
    let storage = BackendRegistry::with_builtins()
        .build(&config)
        .with_context(|| format!("opening backend {:?}", config.backend))?;
    Ok(Engine::new(storage, config.categories))
}
