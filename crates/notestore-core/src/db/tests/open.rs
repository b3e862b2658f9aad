use super::*;
use crate::error::StoreError;
use tempfile::tempdir;

#[test]
fn test_corrupt_store_is_deleted_and_recreated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.db");
    std::fs::write(&path, "this is plain text and certainly not a database file ".repeat(20)).unwrap();

    let index = open_index(&path);
    assert_eq!(index.schema_report().unwrap().status, SchemaStatus::Created);
    assert_eq!(index.note_count().unwrap(), 0);

    index.update_note(sample("a.md")).wait().unwrap();
    assert_eq!(index.note_count().unwrap(), 1);
    index.shutdown().unwrap();
    assert!(path.exists());
}

#[test]
fn test_missing_store_path_is_not_configured() {
    let err = NoteIndex::initialize(&StoreConfig::default()).err().unwrap();
    assert!(matches!(err, StoreError::StoreNotConfigured { .. }));
}

#[test]
fn test_missing_parent_directory_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("notes.db");
    assert!(NoteIndex::initialize(&config_for(&path)).is_err());
    assert!(!path.exists());
}

#[test]
fn test_skip_schema_check_leaves_store_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.db");
    let config = StoreConfig {
        skip_schema_check: true,
        ..config_for(&path)
    };

    let index = NoteIndex::initialize(&config).unwrap();
    assert!(index.schema_report().is_none());
    assert_eq!(index.schema_version().unwrap(), None);
}

#[test]
fn test_in_memory_executor() {
    let plan = MigrationPlan::current().unwrap();
    let exec = EmbeddedExecutor::open_in_memory().unwrap();
    let index = NoteIndex::with_executor(Box::new(exec), &plan, &StoreConfig::default()).unwrap();

    assert!(index.store_path().is_none());
    index.update_note(sample("a.md")).wait().unwrap();
    assert_eq!(index.get_note("a.md").unwrap().unwrap().title, "A");

    let stats = index.shutdown().unwrap();
    assert_eq!(stats.failed, 0);
}

#[test]
fn test_store_path_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.db");
    let index = open_index(&path);
    assert_eq!(index.store_path(), Some(path.as_path()));
}
