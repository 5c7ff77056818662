//! Async wrapper around the blocking engine.
//!
//! The engine is synchronous and holds a process-wide mutex across storage
//! sequences; calling it directly from an async task would stall the
//! executor. [`AsyncEngine`] dispatches every call through
//! `tokio::task::spawn_blocking` with semantics otherwise identical to
//! [`Engine`].

use std::sync::Arc;

use serde_json::Value;
use tokio::task::{JoinError, spawn_blocking};

use crate::engine::{Engine, EngineError, VerifyOutcome};
use crate::item::Item;
use crate::session::Session;
use crate::tombstone::Tombstone;

fn rejoin<T>(result: Result<Result<T, EngineError>, JoinError>) -> Result<T, EngineError> {
    match result {
        Ok(inner) => inner,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => panic!("blocking engine task cancelled: {err}"),
    }
}

/// [`Engine`] behind `spawn_blocking`. Cheap to clone; all clones share the
/// same engine and its write lock.
#[derive(Clone)]
pub struct AsyncEngine {
    inner: Arc<Engine>,
}

impl AsyncEngine {
    /// Wrap an engine for use from async tasks.
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(engine),
        }
    }

    /// The underlying blocking engine.
    #[must_use]
    pub const fn engine(&self) -> &Arc<Engine> {
        &self.inner
    }

    /// Async [`Engine::start`].
    ///
    /// # Errors
    ///
    /// Same as [`Engine::start`].
    pub async fn start(
        &self,
        session: Session,
        metadata: Option<Value>,
        continuation_hash: Option<String>,
    ) -> Result<Item, EngineError> {
        let engine = Arc::clone(&self.inner);
        rejoin(
            spawn_blocking(move || engine.start(&session, metadata, continuation_hash)).await,
        )
    }

    /// Async [`Engine::event_to_session`].
    ///
    /// # Errors
    ///
    /// Same as [`Engine::event_to_session`].
    pub async fn event_to_session(
        &self,
        event: Value,
        session: Session,
        extra_children: Vec<String>,
        label: Option<String>,
    ) -> Result<Item, EngineError> {
        let engine = Arc::clone(&self.inner);
        rejoin(
            spawn_blocking(move || {
                engine.event_to_session(event, &session, extra_children, label)
            })
            .await,
        )
    }

    /// Async [`Engine::close_session`].
    ///
    /// # Errors
    ///
    /// Same as [`Engine::close_session`].
    pub async fn close_session(
        &self,
        session: Session,
        logical_break: bool,
    ) -> Result<String, EngineError> {
        let engine = Arc::clone(&self.inner);
        rejoin(spawn_blocking(move || engine.close_session(&session, logical_break)).await)
    }

    /// Async [`Engine::break_session`].
    ///
    /// # Errors
    ///
    /// Same as [`Engine::break_session`].
    pub async fn break_session(&self, session: Session) -> Result<String, EngineError> {
        let engine = Arc::clone(&self.inner);
        rejoin(spawn_blocking(move || engine.break_session(&session)).await)
    }

    /// Async [`Engine::verify_chain`].
    ///
    /// # Errors
    ///
    /// Same as [`Engine::verify_chain`].
    pub async fn verify_chain(&self, key: String) -> Result<VerifyOutcome, EngineError> {
        let engine = Arc::clone(&self.inner);
        rejoin(spawn_blocking(move || engine.verify_chain(&key)).await)
    }

    /// Async [`Engine::delete_stream_with_tombstone`].
    ///
    /// # Errors
    ///
    /// Same as [`Engine::delete_stream_with_tombstone`].
    pub async fn delete_stream_with_tombstone(
        &self,
        key: String,
        reason: String,
    ) -> Result<Tombstone, EngineError> {
        let engine = Arc::clone(&self.inner);
        rejoin(
            spawn_blocking(move || engine.delete_stream_with_tombstone(&key, &reason)).await,
        )
    }
}
