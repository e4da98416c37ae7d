//! Note use-case service.
//!
//! # Responsibility
//! - Run the quick-capture workflow: classify, derive a title, persist.
//! - Provide manual create/update/get/list/delete APIs.
//! - Apply user overrides while keeping the original verdict for audit.
//!
//! # Invariants
//! - The classifier is consulted only by `capture` and `classify_preview`;
//!   overrides never feed back into it.
//! - Logged events carry ids, buckets and timings only, never note text.

use crate::classifier::{ClassificationResult, Classifier};
use crate::model::bucket::ParaBucket;
use crate::model::note::{BucketOverride, NewNote, Note, NoteId, NotePatch};
use crate::repo::note_repo::{
    normalize_note_limit, normalize_tag, NoteListQuery, NoteRepository, RepoError,
};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Source label stored when a capture does not say where it came from.
pub const DEFAULT_CAPTURE_SOURCE: &str = "quick-capture";
/// Title stored when neither the request nor the content yields one.
pub const UNTITLED_NOTE_TITLE: &str = "Untitled note";

const DERIVED_TITLE_MAX_CHARS: usize = 80;

static MARKDOWN_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\(([^)]+)\)").expect("valid image regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\*_`#>~\[\]]+").expect("valid markdown symbol regex"));
static LIST_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-+]|\d+\.)\s+").expect("valid list marker regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Caller input violates a field contract.
    InvalidInput(String),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            other => Self::Repo(other),
        }
    }
}

/// Quick-capture input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureRequest {
    pub title: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub captured_from: Option<String>,
}

/// Persisted note plus the verdict that filed it.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    pub note: Note,
    pub classification: ClassificationResult,
}

/// Manual filing input; the caller picks the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub para_bucket: ParaBucket,
    pub area_name: Option<String>,
    pub project_outcome: Option<String>,
    pub tags: Vec<String>,
    pub captured_from: Option<String>,
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq)]
pub struct NotesListResult {
    /// Items sorted by `updated_at DESC, id DESC`.
    pub items: Vec<Note>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Note service facade over a repository and a shared classifier.
pub struct NoteService<R: NoteRepository> {
    repo: R,
    classifier: Arc<Classifier>,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository and classifier.
    pub fn new(repo: R, classifier: Arc<Classifier>) -> Self {
        Self { repo, classifier }
    }

    /// Classifies without persisting anything.
    pub fn classify_preview(
        &self,
        content: &str,
        title: Option<&str>,
        tags: &[String],
    ) -> ClassificationResult {
        self.classifier.classify(content, title, Some(tags))
    }

    /// Classifies and persists one captured note.
    ///
    /// # Errors
    /// - `InvalidInput` when `content` is blank.
    /// - Repository failures.
    pub fn capture(&mut self, request: CaptureRequest) -> Result<CaptureOutcome, NoteServiceError> {
        let started_at = Instant::now();
        if request.content.trim().is_empty() {
            return Err(NoteServiceError::InvalidInput(
                "content must not be empty".to_string(),
            ));
        }

        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let classification =
            self.classifier
                .classify(&request.content, title, Some(request.tags.as_slice()));

        let draft = NewNote {
            title: title
                .map(str::to_string)
                .unwrap_or_else(|| derive_title(&request.content)),
            content: request.content,
            para_bucket: classification.bucket,
            area_name: classification.area_name.clone(),
            project_outcome: classification.project_outcome.clone(),
            classification_confidence: Some(classification.confidence),
            classified_by: Some(classification.method.clone()),
            tags: request.tags,
            captured_from: Some(non_blank_or(request.captured_from, DEFAULT_CAPTURE_SOURCE)),
        };

        let id = self.repo.create_note(&draft)?;
        let note = self
            .repo
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(
                "captured note not found in read-back",
            ))?;

        info!(
            "event=note_capture module=service status=ok note_id={} bucket={} area_matched={} confidence={:.2} duration_ms={}",
            note.id,
            classification.bucket,
            classification.area_name.is_some(),
            classification.confidence,
            started_at.elapsed().as_millis()
        );
        Ok(CaptureOutcome {
            note,
            classification,
        })
    }

    /// Files a note manually under a caller-chosen bucket.
    pub fn create_note(&mut self, request: CreateNoteRequest) -> Result<Note, NoteServiceError> {
        let draft = NewNote {
            title: request.title,
            content: request.content,
            para_bucket: request.para_bucket,
            area_name: non_blank(request.area_name),
            project_outcome: non_blank(request.project_outcome),
            classification_confidence: None,
            classified_by: None,
            tags: request.tags,
            captured_from: non_blank(request.captured_from),
        };

        let id = self.repo.create_note(&draft)?;
        info!(
            "event=note_create module=service status=ok note_id={id} bucket={}",
            draft.para_bucket
        );
        self.read_back(id, "created note not found in read-back")
    }

    /// Applies a partial update. A bucket change here is a plain edit and
    /// leaves the override audit fields alone.
    ///
    /// A blank `captured_from` keeps the stored source; other values are
    /// trimmed like on create.
    pub fn update_note(&mut self, id: NoteId, patch: NotePatch) -> Result<Note, NoteServiceError> {
        let patch = NotePatch {
            captured_from: non_blank(patch.captured_from),
            ..patch
        };
        self.repo.update_note(id, &patch)?;
        info!("event=note_update module=service status=ok note_id={id}");
        self.read_back(id, "updated note not found in read-back")
    }

    /// Replaces the classifier verdict with a user choice.
    ///
    /// The first override records the pre-override bucket; later overrides
    /// keep that first value.
    pub fn override_classification(
        &mut self,
        id: NoteId,
        change: BucketOverride,
    ) -> Result<Note, NoteServiceError> {
        let change = BucketOverride {
            para_bucket: change.para_bucket,
            area_name: change.area_name.map(non_blank),
            project_outcome: change.project_outcome.map(non_blank),
        };
        self.repo.apply_override(id, &change)?;
        let note = self.read_back(id, "overridden note not found in read-back")?;
        info!(
            "event=note_override module=service status=ok note_id={id} bucket={} original_bucket={}",
            note.para_bucket,
            note.original_para_bucket
                .map_or("none", ParaBucket::as_str)
        );
        Ok(note)
    }

    /// Replaces the full tag set for one note.
    pub fn set_note_tags(&mut self, id: NoteId, tags: Vec<String>) -> Result<Note, NoteServiceError> {
        if let Some(blank) = tags.iter().find(|tag| tag.trim().is_empty()) {
            return Err(NoteServiceError::InvalidInput(format!(
                "tag `{blank}` must not be blank"
            )));
        }
        self.repo.set_note_tags(id, &tags)?;
        self.read_back(id, "note missing after tag replacement")
    }

    /// Gets one note by id.
    pub fn get_note(&self, id: NoteId) -> Result<Note, NoteServiceError> {
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::NoteNotFound(id))
    }

    /// Lists notes with optional bucket and single-tag filters.
    pub fn list_notes(
        &self,
        bucket: Option<ParaBucket>,
        tag: Option<String>,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<NotesListResult, NoteServiceError> {
        let applied_limit = normalize_note_limit(limit);
        let query = NoteListQuery {
            bucket,
            tag: tag.and_then(|value| normalize_tag(value.as_str())),
            limit: Some(applied_limit),
            offset,
        };
        let items = self.repo.list_notes(&query)?;
        Ok(NotesListResult {
            items,
            applied_limit,
        })
    }

    /// Lists normalized tags known by storage.
    pub fn list_tags(&self) -> Result<Vec<String>, NoteServiceError> {
        Ok(self.repo.list_tags()?)
    }

    /// Deletes one note.
    pub fn delete_note(&mut self, id: NoteId) -> Result<(), NoteServiceError> {
        match self.repo.delete_note(id) {
            Ok(()) => {
                info!("event=note_delete module=service status=ok note_id={id}");
                Ok(())
            }
            Err(err) => {
                warn!("event=note_delete module=service status=error note_id={id} error={err}");
                Err(err.into())
            }
        }
    }

    fn read_back(&self, id: NoteId, context: &'static str) -> Result<Note, NoteServiceError> {
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(context))
    }
}

/// Derives a display title from the first non-empty content line.
///
/// Markdown images are dropped, links keep their label, remaining markdown
/// symbols and list markers are stripped and whitespace is collapsed. The
/// result is capped at 80 chars; blank content yields [`UNTITLED_NOTE_TITLE`].
pub fn derive_title(content: &str) -> String {
    let line = content
        .lines()
        .map(|line| {
            let without_images = MARKDOWN_IMAGE_RE.replace_all(line, " ");
            let without_links = MARKDOWN_LINK_RE.replace_all(&without_images, "$1");
            let without_markers = LIST_MARKER_RE.replace(&without_links, "");
            let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_markers, " ");
            WHITESPACE_RE
                .replace_all(&without_symbols, " ")
                .trim()
                .to_string()
        })
        .find(|line| !line.is_empty());

    match line {
        Some(line) if line.chars().count() > DERIVED_TITLE_MAX_CHARS => {
            let mut truncated = line
                .chars()
                .take(DERIVED_TITLE_MAX_CHARS)
                .collect::<String>()
                .trim_end()
                .to_string();
            truncated.push_str("...");
            truncated
        }
        Some(line) => line,
        None => UNTITLED_NOTE_TITLE.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn non_blank_or(value: Option<String>, fallback: &str) -> String {
    non_blank(value).unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::{derive_title, UNTITLED_NOTE_TITLE};

    #[test]
    fn title_uses_first_non_empty_line_without_markdown() {
        let title = derive_title("\n\n# **Groceries** for [the week](https://example.com)\nmore");
        assert_eq!(title, "Groceries for the week");
    }

    #[test]
    fn title_strips_list_markers_and_images() {
        assert_eq!(derive_title("- ![cover](a.png) buy milk"), "buy milk");
        assert_eq!(derive_title("1. call mom"), "call mom");
    }

    #[test]
    fn title_is_capped_with_ellipsis() {
        let long = "word ".repeat(40);
        let title = derive_title(&long);
        assert!(title.ends_with("..."));
        assert!(title.chars().count() <= 83);
    }

    #[test]
    fn blank_content_falls_back_to_placeholder() {
        assert_eq!(derive_title("   \n `` "), UNTITLED_NOTE_TITLE);
    }
}
