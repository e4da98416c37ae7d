use parasort_core::db::migrations::{latest_name, latest_version};
use parasort_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "notes");
    assert_table_exists(&conn, "tags");
    assert_table_exists(&conn, "note_tags");
}

#[test]
fn classification_columns_are_added_to_notes() {
    let conn = open_db_in_memory().unwrap();

    for column in [
        "area_name",
        "project_outcome",
        "classification_confidence",
        "classified_by",
        "user_overridden",
        "original_para_bucket",
        "captured_from",
    ] {
        assert!(
            column_names(&conn, "notes").iter().any(|name| name == column),
            "column notes.{column} does not exist"
        );
    }
}

#[test]
fn notes_table_rejects_unknown_bucket_and_out_of_range_confidence() {
    let conn = open_db_in_memory().unwrap();

    let bad_bucket = conn.execute(
        "INSERT INTO notes (title, content, para_bucket) VALUES ('t', 'c', 'inbox');",
        [],
    );
    assert!(bad_bucket.is_err());

    let bad_confidence = conn.execute(
        "INSERT INTO notes (title, content, para_bucket, classification_confidence)
         VALUES ('t', 'c', 'resource', 1.5);",
        [],
    );
    assert!(bad_confidence.is_err());
}

#[test]
fn deleting_note_cascades_tag_links() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO notes (id, title, content, para_bucket) VALUES (1, 't', 'c', 'area');
         INSERT INTO tags (id, name) VALUES (1, 'home');
         INSERT INTO note_tags (note_id, tag_id) VALUES (1, 1);
         DELETE FROM notes WHERE id = 1;",
    )
    .unwrap();

    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM note_tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(links, 0);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parasort.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    conn_first
        .execute(
            "INSERT INTO notes (title, content, para_bucket) VALUES ('kept', 'body', 'resource');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(err.to_string().contains("`classification`"));
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
            latest_name: name,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
            assert_eq!(name, latest_name());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failing_migration_is_reported_by_name_and_rolled_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("half-migrated.sqlite3");

    // Schema at version 2 with a column that migration 3 adds again.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE notes (id INTEGER PRIMARY KEY, area_name TEXT);
         PRAGMA user_version = 2;",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match &err {
        DbError::Migration { version, name, .. } => {
            assert_eq!(*version, 3);
            assert_eq!(*name, "classification");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("classification"));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 2);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
