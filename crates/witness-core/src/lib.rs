//! Merkle-chained, append-only log store for event-sourced data.
//!
//! Events are appended to per-session streams where every item carries a
//! SHA-256 hash over its children (the event payload hash, the previous
//! item's hash, optional cross-references) and its timestamp. The final
//! item's hash commits to the whole stream: any modification, insertion, or
//! removal of earlier data is detectable from that one value.
//!
//! # Core pieces
//!
//! - [`Engine`] — the stream lifecycle: [`Engine::start`],
//!   [`Engine::event_to_session`], [`Engine::close_session`] (which
//!   content-addresses the stream under its final hash and fans out to
//!   parent streams), [`Engine::break_session`], [`Engine::verify_chain`],
//!   and [`Engine::delete_stream_with_tombstone`].
//! - [`StreamStorage`] — the pluggable backend surface, with
//!   [`MemoryStorage`] and [`FsStorage`] built in and a
//!   [`config::BackendRegistry`] for embedder-supplied backends.
//! - [`Session`] — category → values descriptors whose canonical JSON is
//!   the stream key; each (category, value) pair also names a long-lived
//!   parent stream queried through [`index`].
//! - [`Tombstone`] — irreversible-but-auditable deletion: event data goes,
//!   the hash skeleton stays resolvable.
//! - [`aio::AsyncEngine`] — the same engine behind `spawn_blocking`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use witness_core::{Engine, MemoryStorage, Session, VerifyOutcome};
//!
//! # fn main() -> Result<(), witness_core::EngineError> {
//! let engine = Engine::new(Arc::new(MemoryStorage::new()), ["student", "tool"]);
//! let session = Session::new().with("student", "Alice").with("tool", "editor");
//!
//! engine.start(&session, None, None)?;
//! engine.event_to_session(json!({"type": "keystroke", "key": "a"}), &session, vec![], None)?;
//! let final_hash = engine.close_session(&session, false)?;
//!
//! assert!(matches!(
//!     engine.verify_chain(&final_hash)?,
//!     VerifyOutcome::Chain { items: 3 },
//! ));
//! # Ok(())
//! # }
//! ```

pub mod aio;
pub mod canonical;
pub mod clock;
pub mod config;
pub mod engine;
pub mod hash;
pub mod index;
pub mod item;
pub mod session;
pub mod storage;
pub mod tombstone;
pub mod verify;

pub use canonical::canonical_json;
pub use config::{BackendRegistry, ConfigError, StoreConfig};
pub use engine::{Engine, EngineError, VerifyOutcome};
pub use hash::{HashError, abbrev, digest, event_hash, item_hash};
pub use index::{Resolved, finished_sessions, resolve};
pub use item::Item;
pub use session::{Session, parent_key};
pub use storage::{FsStorage, MemoryStorage, Record, StorageError, StreamStorage};
pub use tombstone::{TOMBSTONE_PREFIX, Tombstone, tombstone_key};
pub use verify::{IntegrityViolation, Invariant, verify_items, verify_tombstone};
