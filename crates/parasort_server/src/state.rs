//! Shared application state for request handlers.
//!
//! # Invariants
//! - One SQLite connection per process, serialized behind a mutex. The lock
//!   is only taken on the blocking pool, never on a runtime worker.
//! - The notes schema is verified once when the state is built.
//! - The classifier is immutable and shared.

use crate::config::ServerConfig;
use crate::error::{ApiError, ServerError};
use log::warn;
use parasort_core::db::open_db;
use parasort_core::{
    ensure_note_connection_ready, Classifier, NoteService, NoteServiceError, SqliteNoteRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub struct AppState {
    conn: Mutex<Connection>,
    classifier: Arc<Classifier>,
    pub config: ServerConfig,
}

impl AppState {
    /// Wraps an already migrated connection.
    ///
    /// # Errors
    /// - `Storage` when the connection lacks the notes schema.
    pub fn new(
        conn: Connection,
        classifier: Classifier,
        config: ServerConfig,
    ) -> Result<Self, ServerError> {
        ensure_note_connection_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            classifier: Arc::new(classifier),
            config,
        })
    }

    /// Opens the configured database file with the built-in classifier.
    pub fn open(config: ServerConfig) -> Result<Self, ServerError> {
        let conn = open_db(&config.db_path)?;
        Self::new(conn, Classifier::default(), config)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Runs `f` on the blocking pool against a note service bound to the
    /// shared connection.
    ///
    /// # Errors
    /// - Whatever `f` returns, mapped onto [`ApiError`].
    /// - `Internal` when the blocking task panics or is cancelled.
    pub async fn with_service<T, F>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> Result<T, NoteServiceError>
            + Send
            + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || state.run_service(f))
            .await
            .map_err(|err| ApiError::Internal(format!("service task failed: {err}")))?
    }

    fn run_service<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> Result<T, NoteServiceError>,
    {
        // An unwinding panic drops any open rusqlite transaction, which rolls
        // it back, so the connection behind a poisoned lock is still usable.
        let mut conn = self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("event=db_lock module=server status=recovered reason=poisoned");
            poisoned.into_inner()
        });
        let repo = SqliteNoteRepository::from_checked(&mut conn);
        let mut service = NoteService::new(repo, Arc::clone(&self.classifier));
        Ok(f(&mut service)?)
    }
}
