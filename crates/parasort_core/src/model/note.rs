//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical persisted note record and its write-side drafts.
//! - Validate record-level invariants before persistence and after reads.
//!
//! # Invariants
//! - `title` and `content` are never blank.
//! - `classification_confidence`, when set, is finite and within `[0, 1]`.
//! - `user_overridden == true` implies `original_para_bucket.is_some()`.

use crate::model::bucket::ParaBucket;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Integer primary key assigned by storage.
pub type NoteId = i64;

/// Canonical persisted note with classification output and override audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub para_bucket: ParaBucket,
    /// Free-form area label such as "Cooking" or "Finance".
    pub area_name: Option<String>,
    /// What "done" looks like; only meaningful for projects.
    pub project_outcome: Option<String>,
    pub classification_confidence: Option<f64>,
    /// Strategy tag of the classifier that filed the note (`None` when the
    /// user filed it manually).
    pub classified_by: Option<String>,
    pub user_overridden: bool,
    /// Bucket chosen before the first user override.
    pub original_para_bucket: Option<ParaBucket>,
    /// Lowercase, deduplicated, sorted.
    pub tags: Vec<String>,
    pub captured_from: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Write-side draft for a note that has no storage id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub para_bucket: ParaBucket,
    pub area_name: Option<String>,
    pub project_outcome: Option<String>,
    pub classification_confidence: Option<f64>,
    pub classified_by: Option<String>,
    pub tags: Vec<String>,
    pub captured_from: Option<String>,
}

impl NewNote {
    /// Creates a manually filed draft with no classification metadata.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        para_bucket: ParaBucket,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            para_bucket,
            area_name: None,
            project_outcome: None,
            classification_confidence: None,
            classified_by: None,
            tags: Vec::new(),
            captured_from: None,
        }
    }

    /// Checks draft invariants shared with [`Note::validate`].
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_text_fields(&self.title, &self.content)?;
        validate_confidence(self.classification_confidence)
    }
}

/// Partial field update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub para_bucket: Option<ParaBucket>,
    pub tags: Option<Vec<String>>,
    pub captured_from: Option<String>,
}

impl NotePatch {
    /// Returns whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.para_bucket.is_none()
            && self.tags.is_none()
            && self.captured_from.is_none()
    }
}

/// User replacement of a classifier verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketOverride {
    pub para_bucket: ParaBucket,
    /// `Some(None)` clears the stored area; `None` keeps it.
    pub area_name: Option<Option<String>>,
    /// `Some(None)` clears the stored outcome; `None` keeps it.
    pub project_outcome: Option<Option<String>>,
}

/// Record-level validation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteValidationError {
    EmptyTitle,
    EmptyContent,
    ConfidenceOutOfRange(f64),
    MissingOriginalBucket,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => f.write_str("note title must not be empty"),
            Self::EmptyContent => f.write_str("note content must not be empty"),
            Self::ConfidenceOutOfRange(value) => {
                write!(f, "classification confidence {value} is outside [0, 1]")
            }
            Self::MissingOriginalBucket => {
                f.write_str("overridden note must record its original bucket")
            }
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    /// Checks record invariants.
    ///
    /// # Errors
    /// - Blank title or content.
    /// - Confidence outside `[0, 1]` or not finite.
    /// - Overridden flag without the audit bucket.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_text_fields(&self.title, &self.content)?;
        validate_confidence(self.classification_confidence)?;
        if self.user_overridden && self.original_para_bucket.is_none() {
            return Err(NoteValidationError::MissingOriginalBucket);
        }
        Ok(())
    }
}

fn validate_text_fields(title: &str, content: &str) -> Result<(), NoteValidationError> {
    if title.trim().is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    if content.trim().is_empty() {
        return Err(NoteValidationError::EmptyContent);
    }
    Ok(())
}

fn validate_confidence(value: Option<f64>) -> Result<(), NoteValidationError> {
    match value {
        Some(confidence) if !(0.0..=1.0).contains(&confidence) || !confidence.is_finite() => {
            Err(NoteValidationError::ConfidenceOutOfRange(confidence))
        }
        _ => Ok(()),
    }
}
