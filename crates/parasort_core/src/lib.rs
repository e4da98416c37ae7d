//! Core domain logic for ParaSort.
//! This crate is the single source of truth for classification rules and
//! note storage invariants.

pub mod classifier;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use classifier::{
    AreaKeywords, ClassificationResult, Classifier, ClassifierConfig, ConfidenceTiers,
    InvalidConfidenceTier,
};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget,
};
pub use model::bucket::{ParaBucket, UnknownBucket};
pub use model::note::{BucketOverride, NewNote, Note, NoteId, NotePatch, NoteValidationError};
pub use repo::note_repo::{
    ensure_note_connection_ready, NoteListQuery, NoteRepository, RepoError, RepoResult,
    SqliteNoteRepository,
};
pub use service::note_service::{
    CaptureOutcome, CaptureRequest, CreateNoteRequest, NoteService, NoteServiceError,
    NotesListResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
