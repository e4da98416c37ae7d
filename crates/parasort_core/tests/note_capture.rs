use parasort_core::db::open_db_in_memory;
use parasort_core::service::note_service::{DEFAULT_CAPTURE_SOURCE, UNTITLED_NOTE_TITLE};
use parasort_core::{
    BucketOverride, CaptureRequest, Classifier, CreateNoteRequest, NotePatch, NoteService,
    NoteServiceError, ParaBucket, SqliteNoteRepository,
};
use rusqlite::params;
use std::sync::Arc;

fn capture(content: &str) -> CaptureRequest {
    CaptureRequest {
        content: content.to_string(),
        ..CaptureRequest::default()
    }
}

fn manual(title: &str, bucket: ParaBucket, tags: &[&str]) -> CreateNoteRequest {
    CreateNoteRequest {
        title: title.to_string(),
        content: format!("{title} body"),
        para_bucket: bucket,
        area_name: None,
        project_outcome: None,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        captured_from: None,
    }
}

#[test]
fn capture_persists_classification_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo, Arc::new(Classifier::default()));

    let outcome = service
        .capture(CaptureRequest {
            title: Some("Kitchen".to_string()),
            content: "Plan the kitchen remodel by next Friday".to_string(),
            tags: vec!["Cook".to_string()],
            captured_from: Some("share-sheet".to_string()),
        })
        .unwrap();

    let note = &outcome.note;
    assert_eq!(note.title, "Kitchen");
    assert_eq!(note.para_bucket, ParaBucket::Project);
    assert_eq!(note.para_bucket, outcome.classification.bucket);
    assert_eq!(note.area_name.as_deref(), Some("Cooking"));
    assert_eq!(note.project_outcome.as_deref(), Some("Kitchen"));
    assert_eq!(
        note.classification_confidence,
        Some(outcome.classification.confidence)
    );
    assert_eq!(note.classified_by.as_deref(), Some("heuristic"));
    assert!(!note.user_overridden);
    assert_eq!(note.original_para_bucket, None);
    assert_eq!(note.tags, vec!["cook"]);
    assert_eq!(note.captured_from.as_deref(), Some("share-sheet"));
    assert!(note.created_at > 0);
    assert_eq!(service.get_note(note.id).unwrap(), outcome.note);
}

#[test]
fn capture_without_title_derives_one_and_defaults_source() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo, Arc::new(Classifier::default()));

    let outcome = service
        .capture(capture("\n- Check out https://example.com/article\nlater"))
        .unwrap();

    assert_eq!(
        outcome.note.title,
        "Check out https://example.com/article"
    );
    assert_eq!(outcome.note.para_bucket, ParaBucket::Resource);
    assert_eq!(outcome.note.area_name, None);
    assert_eq!(
        outcome.note.captured_from.as_deref(),
        Some(DEFAULT_CAPTURE_SOURCE)
    );
}

#[test]
fn capture_with_blank_title_uses_untitled_project_outcome() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo, Arc::new(Classifier::default()));

    let mut request = capture("Ship the report by tomorrow");
    request.title = Some("   ".to_string());
    let outcome = service.capture(request).unwrap();

    assert_eq!(outcome.note.para_bucket, ParaBucket::Project);
    assert_eq!(
        outcome.note.project_outcome.as_deref(),
        Some("Untitled project")
    );
    assert_eq!(outcome.note.title, "Ship the report by tomorrow");
    assert_ne!(outcome.note.title, UNTITLED_NOTE_TITLE);
}

#[test]
fn capture_rejects_blank_content() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo, Arc::new(Classifier::default()));

    let err = service.capture(capture("   \n  ")).unwrap_err();
    assert!(matches!(err, NoteServiceError::InvalidInput(_)));
    assert!(service.list_notes(None, None, None, 0).unwrap().items.is_empty());
}

#[test]
fn override_keeps_first_original_bucket() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo, Arc::new(Classifier::default()));
    let captured = service
        .capture(capture("Ship the report by tomorrow"))
        .unwrap()
        .note;
    assert_eq!(captured.para_bucket, ParaBucket::Project);

    let first = service
        .override_classification(
            captured.id,
            BucketOverride {
                para_bucket: ParaBucket::Archive,
                area_name: None,
                project_outcome: Some(None),
            },
        )
        .unwrap();
    assert_eq!(first.para_bucket, ParaBucket::Archive);
    assert!(first.user_overridden);
    assert_eq!(first.original_para_bucket, Some(ParaBucket::Project));
    assert_eq!(first.project_outcome, None);

    let second = service
        .override_classification(
            captured.id,
            BucketOverride {
                para_bucket: ParaBucket::Area,
                area_name: Some(Some(" Career ".to_string())),
                project_outcome: None,
            },
        )
        .unwrap();
    assert_eq!(second.para_bucket, ParaBucket::Area);
    assert_eq!(second.original_para_bucket, Some(ParaBucket::Project));
    assert_eq!(second.area_name.as_deref(), Some("Career"));
    assert_eq!(second.classified_by.as_deref(), Some("heuristic"));
}

#[test]
fn override_missing_note_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo, Arc::new(Classifier::default()));

    let err = service
        .override_classification(
            404,
            BucketOverride {
                para_bucket: ParaBucket::Area,
                area_name: None,
                project_outcome: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::NoteNotFound(404)));
}

#[test]
fn patch_updates_fields_without_marking_override() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo, Arc::new(Classifier::default()));
    let created = service
        .create_note(manual("groceries", ParaBucket::Resource, &["home"]))
        .unwrap();
    assert_eq!(created.classified_by, None);
    assert_eq!(created.classification_confidence, None);

    let updated = service
        .update_note(
            created.id,
            NotePatch {
                title: Some("  weekly groceries ".to_string()),
                para_bucket: Some(ParaBucket::Area),
                tags: Some(vec!["Food".to_string(), "food".to_string()]),
                ..NotePatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.title, "weekly groceries");
    assert_eq!(updated.content, "groceries body");
    assert_eq!(updated.para_bucket, ParaBucket::Area);
    assert_eq!(updated.tags, vec!["food"]);
    assert!(!updated.user_overridden);
    assert_eq!(updated.original_para_bucket, None);
    assert!(updated.updated_at >= created.updated_at);

    let blank = service
        .update_note(
            created.id,
            NotePatch {
                content: Some(" ".to_string()),
                ..NotePatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(blank, NoteServiceError::InvalidInput(_)));
}

#[test]
fn patch_trims_source_and_ignores_blank_source() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo, Arc::new(Classifier::default()));
    let captured = service.capture(capture("just some thoughts")).unwrap().note;

    let trimmed = service
        .update_note(
            captured.id,
            NotePatch {
                captured_from: Some("  share-sheet ".to_string()),
                ..NotePatch::default()
            },
        )
        .unwrap();
    assert_eq!(trimmed.captured_from.as_deref(), Some("share-sheet"));

    let blank = service
        .update_note(
            captured.id,
            NotePatch {
                captured_from: Some("   ".to_string()),
                ..NotePatch::default()
            },
        )
        .unwrap();
    assert_eq!(blank.captured_from.as_deref(), Some("share-sheet"));
}

#[test]
fn list_filters_by_bucket_and_tag_in_stable_order() {
    let mut conn = open_db_in_memory().unwrap();
    let (older, newer, other) = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = NoteService::new(repo, Arc::new(Classifier::default()));
        let older = service
            .create_note(manual("older", ParaBucket::Area, &["Health"]))
            .unwrap();
        let newer = service
            .create_note(manual("newer", ParaBucket::Area, &["health", "gym"]))
            .unwrap();
        let other = service
            .create_note(manual("other", ParaBucket::Resource, &["gym"]))
            .unwrap();
        (older.id, newer.id, other.id)
    };

    conn.execute(
        "UPDATE notes SET updated_at = 1000 WHERE id = ?1;",
        params![older],
    )
    .unwrap();
    conn.execute(
        "UPDATE notes SET updated_at = 2000 WHERE id = ?1;",
        params![newer],
    )
    .unwrap();

    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let service = NoteService::new(repo, Arc::new(Classifier::default()));

    let areas = service
        .list_notes(Some(ParaBucket::Area), None, Some(10), 0)
        .unwrap();
    let ids = areas.items.iter().map(|note| note.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![newer, older]);
    assert_eq!(areas.applied_limit, 10);

    let gym = service
        .list_notes(None, Some(" GYM ".to_string()), None, 0)
        .unwrap();
    let mut gym_ids = gym.items.iter().map(|note| note.id).collect::<Vec<_>>();
    gym_ids.sort_unstable();
    assert_eq!(gym_ids, vec![newer, other]);
    assert_eq!(gym.applied_limit, 50);

    let paged = service
        .list_notes(Some(ParaBucket::Area), None, Some(1), 1)
        .unwrap();
    assert_eq!(paged.items.len(), 1);
    assert_eq!(paged.items[0].id, older);

    assert_eq!(service.list_tags().unwrap(), vec!["gym", "health"]);
}

#[test]
fn set_note_tags_replaces_full_set() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo, Arc::new(Classifier::default()));
    let created = service
        .create_note(manual("trip", ParaBucket::Project, &["travel", "visa"]))
        .unwrap();

    let updated = service
        .set_note_tags(created.id, vec!["Passport".to_string()])
        .unwrap();
    assert_eq!(updated.tags, vec!["passport"]);

    let err = service
        .set_note_tags(created.id, vec!["  ".to_string()])
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::InvalidInput(_)));
}

#[test]
fn delete_removes_note_and_reports_missing_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo, Arc::new(Classifier::default()));
    let created = service
        .create_note(manual("scratch", ParaBucket::Archive, &[]))
        .unwrap();

    service.delete_note(created.id).unwrap();
    assert!(matches!(
        service.get_note(created.id).unwrap_err(),
        NoteServiceError::NoteNotFound(_)
    ));
    assert!(matches!(
        service.delete_note(created.id).unwrap_err(),
        NoteServiceError::NoteNotFound(_)
    ));
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(SqliteNoteRepository::try_new(&mut conn).is_err());
}
