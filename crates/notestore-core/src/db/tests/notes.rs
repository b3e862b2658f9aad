use super::*;
use crate::error::StoreError;
use serde_json::json;
use tempfile::{tempdir, TempDir};

fn fresh() -> (TempDir, NoteIndex) {
    let dir = tempdir().unwrap();
    let index = open_index(&dir.path().join("notes.db"));
    (dir, index)
}

fn relation_rows(path: &Path, table: &str) -> usize {
    raw(path, &format!("SELECT note_path FROM {table};"))
        .into_rows()
        .unwrap()
        .len()
}

#[test]
fn test_update_stores_note_fields() {
    let (_dir, index) = fresh();
    index
        .update_note(
            NoteRecord::new("Notes/A.md", "Hello World")
                .with_content("it's lower already")
                .with_timestamps(10, 20),
        )
        .wait()
        .unwrap();

    let note = index.get_note("Notes/A.md").unwrap().unwrap();
    assert_eq!(note.title, "Hello World");
    assert_eq!(note.title_lower, "hello world");
    assert_eq!(note.content_lower, "it's lower already");
    assert_eq!((note.created, note.last_modified), (10, 20));
    assert_eq!(note.last_opened, None);
}

#[test]
fn test_tag_set_is_replaced_not_merged() {
    let (_dir, index) = fresh();
    index.update_note(sample("a.md")).wait().unwrap();
    assert_eq!(tag_names(&index, "a.md"), vec!["x", "y"]);

    index
        .update_note(sample("a.md").with_tags(["#y"]))
        .wait()
        .unwrap();
    assert_eq!(tag_names(&index, "a.md"), vec!["y"]);

    index
        .update_note(sample("a.md").with_tags(Vec::<String>::new()))
        .wait()
        .unwrap();
    assert!(tag_names(&index, "a.md").is_empty());
}

#[test]
fn test_tags_differing_in_case_are_one_row() {
    let (_dir, index) = fresh();
    index
        .update_note(sample("a.md").with_tags(["#Rust", "rust", "#RUST", "#", "  "]))
        .wait()
        .unwrap();

    let tags = index.tags_for("a.md").unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].tag_name, "Rust");
    assert_eq!(tags[0].tag_name_lower, "rust");
}

#[test]
fn test_padded_tags_lose_marker_and_whitespace() {
    let (_dir, index) = fresh();
    index
        .update_note(sample("a.md").with_tags([" #x", "# y ", " # "]))
        .wait()
        .unwrap();
    assert_eq!(tag_names(&index, "a.md"), vec!["x", "y"]);
}

#[test]
fn test_frontmatter_is_replaced_and_lower_cased() {
    let (_dir, index) = fresh();
    let record = NoteRecord::new("a.md", "A")
        .with_frontmatter("Status", "Draft")
        .with_frontmatter("rating", 3)
        .with_frontmatter("aliases", json!(["One", "Two"]));
    index.update_note(record).wait().unwrap();

    let fm = index.frontmatter_for("a.md").unwrap();
    let pairs: Vec<(&str, &str)> = fm
        .iter()
        .map(|f| (f.frontmatter_name.as_str(), f.frontmatter_value.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("aliases", r#"["One","Two"]"#), ("rating", "3"), ("Status", "Draft")]
    );
    let status = &fm[2];
    assert_eq!(status.frontmatter_name_lower, "status");
    assert_eq!(status.frontmatter_value_lower, "draft");

    index
        .update_note(NoteRecord::new("a.md", "A").with_frontmatter("rating", 4))
        .wait()
        .unwrap();
    let fm = index.frontmatter_for("a.md").unwrap();
    assert_eq!(fm.len(), 1);
    assert_eq!(fm[0].frontmatter_value, "4");
}

#[test]
fn test_last_record_for_a_path_wins_within_batch() {
    let (_dir, index) = fresh();
    index
        .update_notes(vec![
            NoteRecord::new("a.md", "First").with_tags(["#old"]),
            NoteRecord::new("b.md", "B"),
            NoteRecord::new("a.md", "Second").with_tags(["#new"]),
        ])
        .wait()
        .unwrap();

    assert_eq!(index.note_count().unwrap(), 2);
    assert_eq!(index.get_note("a.md").unwrap().unwrap().title, "Second");
    assert_eq!(tag_names(&index, "a.md"), vec!["new"]);
}

#[test]
fn test_later_update_wins() {
    let (_dir, index) = fresh();
    index.update_note(NoteRecord::new("a.md", "One")).wait().unwrap();
    index.update_note(NoteRecord::new("a.md", "Two")).wait().unwrap();

    assert_eq!(index.note_count().unwrap(), 1);
    assert_eq!(index.get_note("a.md").unwrap().unwrap().title, "Two");
}

#[test]
fn test_delete_cascades_to_relations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.db");
    let index = open_index(&path);
    index
        .update_notes(vec![sample("a.md"), sample("b.md")])
        .wait()
        .unwrap();

    index.delete_note("a.md").wait().unwrap();
    assert!(index.get_note("a.md").unwrap().is_none());
    assert!(index.tags_for("a.md").unwrap().is_empty());
    assert!(index.frontmatter_for("a.md").unwrap().is_empty());
    assert_eq!(tag_names(&index, "b.md"), vec!["x", "y"]);
    index.shutdown().unwrap();

    assert_eq!(relation_rows(&path, "note_tag"), 2);
    assert_eq!(relation_rows(&path, "note_frontmatter"), 1);
}

#[test]
fn test_delete_of_unknown_note_succeeds() {
    let (_dir, index) = fresh();
    index.delete_note("nope.md").wait().unwrap();
    index.update_last_opened("nope.md").wait().unwrap();
    assert_eq!(index.note_count().unwrap(), 0);
}

#[test]
fn test_last_opened_survives_content_update() {
    let (_dir, index) = fresh();
    index.update_note(sample("a.md")).wait().unwrap();

    let before = chrono::Utc::now().timestamp_millis();
    index.update_last_opened("a.md").wait().unwrap();
    let opened = index.get_note("a.md").unwrap().unwrap().last_opened.unwrap();
    assert!(opened >= before);

    index
        .update_note(sample("a.md").with_content("edited"))
        .wait()
        .unwrap();
    let note = index.get_note("a.md").unwrap().unwrap();
    assert_eq!(note.content_lower, "edited");
    assert_eq!(note.last_opened, Some(opened));
}

#[test]
fn test_quotes_and_unicode_round_trip() {
    let (_dir, index) = fresh();
    let record = NoteRecord::new("it's/ünïcode.md", "O'Brien's \"notes\"")
        .with_content("'; DROP TABLE note; --")
        .with_tags(["#don't"]);
    index.update_note(record).wait().unwrap();

    let note = index.get_note("it's/ünïcode.md").unwrap().unwrap();
    assert_eq!(note.title, "O'Brien's \"notes\"");
    assert_eq!(note.content_lower, "'; DROP TABLE note; --");
    assert_eq!(tag_names(&index, "it's/ünïcode.md"), vec!["don't"]);
    assert_eq!(index.note_count().unwrap(), 1);
}

#[test]
fn test_invalid_record_rejects_whole_batch() {
    let (_dir, index) = fresh();
    let err = index
        .update_notes(vec![sample("a.md"), NoteRecord::new("", "Empty")])
        .wait()
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidValue { .. }));
    assert_eq!(index.note_count().unwrap(), 0);
}

#[test]
fn test_nul_in_text_is_rejected_and_store_unchanged() {
    let (_dir, index) = fresh();
    index.update_note(sample("a.md")).wait().unwrap();

    let err = index
        .update_note(sample("a.md").with_content("before\u{0}after"))
        .wait()
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidValue { .. }));

    let err = index
        .update_note(sample("a.md").with_tags(["#z\u{0}"]))
        .wait()
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidValue { .. }));

    assert_eq!(
        index.get_note("a.md").unwrap().unwrap().content_lower,
        "hello world"
    );
    assert_eq!(tag_names(&index, "a.md"), vec!["x", "y"]);
}

#[test]
fn test_empty_batch_is_a_no_op() {
    let (_dir, index) = fresh();
    index.update_notes(Vec::new()).wait().unwrap();
    let stats = index.shutdown().unwrap();
    assert_eq!(stats.completed, 0);
}
