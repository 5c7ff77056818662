//! Store configuration and the backend registry.
//!
//! A store is described by a small TOML file:
//!
//! ```toml
//! backend = "fs"
//! root = "/var/lib/witness"
//! categories = ["student", "teacher", "tool"]
//! ```
//!
//! Every field has a default; an empty file is a valid config. Backends are
//! looked up by name in a [`BackendRegistry`] the caller assembles —
//! embedders can register their own constructors next to the built-in
//! `memory` and `fs` ones.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::{FsStorage, MemoryStorage, StorageError, StreamStorage};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML (or has wrong field types).
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configured backend name is not in the registry.
    #[error("unknown backend {name:?} (known: {known:?})")]
    UnknownBackend {
        /// The name the config asked for.
        name: String,
        /// Registered backend names.
        known: Vec<String>,
    },

    /// The backend requires a `root` directory and none was configured.
    #[error("backend {backend:?} requires a root directory")]
    MissingRoot {
        /// The backend that needed it.
        backend: String,
    },

    /// The backend constructor failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The category names that receive parent propagation when nothing else is
/// configured.
pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "assignment",
    "classroom",
    "course",
    "school",
    "student",
    "teacher",
    "tool",
];

fn default_backend() -> String {
    "fs".to_string()
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect()
}

/// Deserialized store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend name, resolved through the registry. Default `"fs"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Root directory for filesystem-backed stores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Categories that trigger parent-stream propagation on close.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root: None,
            categories: default_categories(),
        }
    }
}

impl StoreConfig {
    /// Load a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read or
    /// [`ConfigError::Parse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config = toml::from_str(&text)?;
        debug!(path = %path.display(), ?config, "config loaded");
        Ok(config)
    }
}

type Constructor =
    Box<dyn Fn(&StoreConfig) -> Result<Arc<dyn StreamStorage>, ConfigError> + Send + Sync>;

/// Name → backend constructor mapping.
///
/// `with_builtins` registers `memory` and `fs`; embedders add their own with
/// [`BackendRegistry::register`].
#[derive(Default)]
pub struct BackendRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl BackendRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in `memory` and `fs` backends.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("memory", |_| Ok(Arc::new(MemoryStorage::new())));
        registry.register("fs", |config| {
            let root = config.root.as_ref().ok_or_else(|| ConfigError::MissingRoot {
                backend: config.backend.clone(),
            })?;
            Ok(Arc::new(FsStorage::open(root)?))
        });
        registry
    }

    /// Register (or replace) a backend constructor under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&StoreConfig) -> Result<Arc<dyn StreamStorage>, ConfigError> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Registered backend names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    /// Construct the backend the config names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownBackend`] for an unregistered name, or
    /// whatever the constructor returns.
    pub fn build(&self, config: &StoreConfig) -> Result<Arc<dyn StreamStorage>, ConfigError> {
        let constructor =
            self.constructors
                .get(&config.backend)
                .ok_or_else(|| ConfigError::UnknownBackend {
                    name: config.backend.clone(),
                    known: self.names(),
                })?;
        constructor(config)
    }
}
