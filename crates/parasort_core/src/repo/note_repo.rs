//! Note/tag repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes together with their classification output and override
//!   audit fields.
//! - Own tag-link replacement with atomic semantics.
//!
//! # Invariants
//! - Write paths validate drafts before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Tag names are normalized to lowercase before persistence.
//! - An override records the pre-override bucket only once; later overrides
//!   keep the first recorded value.

use crate::db::DbError;
use crate::model::bucket::ParaBucket;
use crate::model::note::{
    BucketOverride, NewNote, Note, NoteId, NotePatch, NoteValidationError,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTES_DEFAULT_LIMIT: u32 = 50;
const NOTES_LIMIT_MAX: u32 = 200;

const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    para_bucket,
    area_name,
    project_outcome,
    classification_confidence,
    classified_by,
    user_overridden,
    original_para_bucket,
    captured_from,
    created_at,
    updated_at
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "required column `{table}.{column}` is missing; run migrations first"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for note list use-cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Optional bucket filter.
    pub bucket: Option<ParaBucket>,
    /// Optional single-tag exact match filter.
    pub tag: Option<String>,
    /// Maximum rows to return. Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for notes/tags operations.
pub trait NoteRepository {
    /// Inserts a note with its tags and returns the assigned id.
    fn create_note(&mut self, draft: &NewNote) -> RepoResult<NoteId>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists notes ordered by `updated_at DESC, id DESC`.
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Applies a partial field update.
    fn update_note(&mut self, id: NoteId, patch: &NotePatch) -> RepoResult<()>;
    /// Replaces the verdict with a user choice and records the audit bucket.
    fn apply_override(&mut self, id: NoteId, change: &BucketOverride) -> RepoResult<()>;
    /// Replaces all tags for the given note in one transaction.
    fn set_note_tags(&mut self, id: NoteId, tags: &[String]) -> RepoResult<()>;
    /// Returns all known tags sorted by name.
    fn list_tags(&self) -> RepoResult<Vec<String>>;
    /// Hard-deletes one note and its tag links.
    fn delete_note(&mut self, id: NoteId) -> RepoResult<()>;
}

/// SQLite-backed notes/tags repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema has
    ///   not been migrated.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_note_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection that already passed
    /// [`ensure_note_connection_ready`], skipping the schema queries.
    ///
    /// For long-lived connections checked once at startup.
    pub fn from_checked(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&mut self, draft: &NewNote) -> RepoResult<NoteId> {
        draft.validate()?;
        let tags = normalize_tags(&draft.tags);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO notes (
                title,
                content,
                para_bucket,
                area_name,
                project_outcome,
                classification_confidence,
                classified_by,
                captured_from
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                draft.title.trim(),
                draft.content.as_str(),
                draft.para_bucket.as_str(),
                draft.area_name.as_deref(),
                draft.project_outcome.as_deref(),
                draft.classification_confidence,
                draft.classified_by.as_deref(),
                draft.captured_from.as_deref(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        replace_tags_in_tx(&tx, id, &tags)?;
        tx.commit()?;

        Ok(id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(&*self.conn, row)?));
        }

        Ok(None)
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(bucket) = query.bucket {
            sql.push_str(" AND para_bucket = ?");
            bind_values.push(Value::Text(bucket.as_str().to_string()));
        }

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM note_tags nt
                    INNER JOIN tags t ON t.id = nt.tag_id
                    WHERE nt.note_id = notes.id
                      AND t.name = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(tag.clone()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id DESC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_note_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(&*self.conn, row)?);
        }

        Ok(notes)
    }

    fn update_note(&mut self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        if patch
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            return Err(NoteValidationError::EmptyTitle.into());
        }
        if patch
            .content
            .as_deref()
            .is_some_and(|content| content.trim().is_empty())
        {
            return Err(NoteValidationError::EmptyContent.into());
        }

        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(title) = patch.title.as_deref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.trim().to_string()));
        }
        if let Some(content) = patch.content.as_ref() {
            assignments.push("content = ?");
            bind_values.push(Value::Text(content.clone()));
        }
        if let Some(bucket) = patch.para_bucket {
            assignments.push("para_bucket = ?");
            bind_values.push(Value::Text(bucket.as_str().to_string()));
        }
        if let Some(captured_from) = patch.captured_from.as_ref() {
            assignments.push("captured_from = ?");
            bind_values.push(Value::Text(captured_from.clone()));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !note_exists_in_tx(&tx, id)? {
            return Err(RepoError::NotFound(id));
        }

        if !assignments.is_empty() {
            let sql = format!(
                "UPDATE notes SET {} WHERE id = ?;",
                assignments.join(", ")
            );
            bind_values.push(Value::Integer(id));
            tx.execute(&sql, params_from_iter(bind_values))?;
        }
        if let Some(tags) = patch.tags.as_ref() {
            replace_tags_in_tx(&tx, id, &normalize_tags(tags))?;
        }
        touch_in_tx(&tx, id)?;

        tx.commit()?;
        Ok(())
    }

    fn apply_override(&mut self, id: NoteId, change: &BucketOverride) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = tx.query_row(
            "SELECT para_bucket, user_overridden, original_para_bucket
             FROM notes
             WHERE id = ?1;",
            [id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        );
        let (bucket_text, overridden, original_text) = match current {
            Ok(values) => values,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Err(RepoError::NotFound(id)),
            Err(err) => return Err(err.into()),
        };

        let original = match (overridden, original_text) {
            (1, Some(original)) => parse_bucket(&original, "original_para_bucket")?,
            (1, None) => return Err(NoteValidationError::MissingOriginalBucket.into()),
            _ => parse_bucket(&bucket_text, "para_bucket")?,
        };

        tx.execute(
            "UPDATE notes
             SET
                para_bucket = ?2,
                user_overridden = 1,
                original_para_bucket = ?3
             WHERE id = ?1;",
            params![id, change.para_bucket.as_str(), original.as_str()],
        )?;
        if let Some(area_name) = change.area_name.as_ref() {
            tx.execute(
                "UPDATE notes SET area_name = ?2 WHERE id = ?1;",
                params![id, area_name.as_deref()],
            )?;
        }
        if let Some(outcome) = change.project_outcome.as_ref() {
            tx.execute(
                "UPDATE notes SET project_outcome = ?2 WHERE id = ?1;",
                params![id, outcome.as_deref()],
            )?;
        }
        touch_in_tx(&tx, id)?;

        tx.commit()?;
        Ok(())
    }

    fn set_note_tags(&mut self, id: NoteId, tags: &[String]) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !note_exists_in_tx(&tx, id)? {
            return Err(RepoError::NotFound(id));
        }

        replace_tags_in_tx(&tx, id, &normalize_tags(tags))?;
        touch_in_tx(&tx, id)?;

        tx.commit()?;
        Ok(())
    }

    fn list_tags(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM tags ORDER BY name COLLATE NOCASE ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get("name")?;
            tags.push(value.to_lowercase());
        }
        Ok(tags)
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Normalizes list limit according to notes contract.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => NOTES_DEFAULT_LIMIT,
        Some(value) if value > NOTES_LIMIT_MAX => NOTES_LIMIT_MAX,
        Some(value) => value,
    }
}

/// Normalizes one tag value according to notes contract.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

fn parse_note_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Note> {
    let id: NoteId = row.get("id")?;
    let bucket_text: String = row.get("para_bucket")?;
    let para_bucket = parse_bucket(&bucket_text, "para_bucket")?;
    let original_para_bucket = match row.get::<_, Option<String>>("original_para_bucket")? {
        Some(value) => Some(parse_bucket(&value, "original_para_bucket")?),
        None => None,
    };
    let user_overridden = match row.get::<_, i64>("user_overridden")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid user_overridden value `{other}` in notes.user_overridden"
            )));
        }
    };

    let note = Note {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        para_bucket,
        area_name: row.get("area_name")?,
        project_outcome: row.get("project_outcome")?,
        classification_confidence: row.get("classification_confidence")?,
        classified_by: row.get("classified_by")?,
        user_overridden,
        original_para_bucket,
        tags: load_tags_for_note(conn, id)?,
        captured_from: row.get("captured_from")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    note.validate()?;
    Ok(note)
}

fn parse_bucket(value: &str, column: &str) -> RepoResult<ParaBucket> {
    ParaBucket::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid bucket `{value}` in notes.{column}"))
    })
}

fn load_tags_for_note(conn: &Connection, note_id: NoteId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM note_tags nt
         INNER JOIN tags t ON t.id = nt.tag_id
         WHERE nt.note_id = ?1
         ORDER BY t.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([note_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value.to_lowercase());
    }
    Ok(tags)
}

// Expects already-normalized tags.
fn replace_tags_in_tx(tx: &Transaction<'_>, note_id: NoteId, tags: &[String]) -> RepoResult<()> {
    tx.execute("DELETE FROM note_tags WHERE note_id = ?1;", [note_id])?;
    for tag in tags {
        tx.execute(
            "INSERT OR IGNORE INTO tags (name) VALUES (?1);",
            [tag.as_str()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO note_tags (note_id, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE name = ?2 COLLATE NOCASE;",
            params![note_id, tag.as_str()],
        )?;
    }
    Ok(())
}

fn touch_in_tx(tx: &Transaction<'_>, note_id: NoteId) -> RepoResult<()> {
    tx.execute(
        &format!("UPDATE notes SET updated_at = {NOW_MS_SQL} WHERE id = ?1;"),
        [note_id],
    )?;
    Ok(())
}

fn note_exists_in_tx(tx: &Transaction<'_>, note_id: NoteId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
        [note_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Verifies the notes/tags schema is present on `conn`.
///
/// # Errors
/// - `MissingRequiredTable` / `MissingRequiredColumn` before migrations ran.
pub fn ensure_note_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["notes", "tags", "note_tags"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for column in [
        "area_name",
        "project_outcome",
        "classification_confidence",
        "classified_by",
        "user_overridden",
        "original_para_bucket",
    ] {
        if !table_has_column(conn, "notes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }

    for column in ["note_id", "tag_id"] {
        if !table_has_column(conn, "note_tags", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "note_tags",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{normalize_note_limit, normalize_tags};

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_note_limit(None), 50);
        assert_eq!(normalize_note_limit(Some(0)), 50);
        assert_eq!(normalize_note_limit(Some(7)), 7);
        assert_eq!(normalize_note_limit(Some(1_000)), 200);
    }

    #[test]
    fn tags_are_trimmed_lowercased_and_deduplicated() {
        let tags = vec![
            " Work ".to_string(),
            "work".to_string(),
            "  ".to_string(),
            "Alpha".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["alpha", "work"]);
    }
}
