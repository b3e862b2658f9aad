//! SQL text generation for note writes and lookups
//!
//! Values are interpolated into the script rather than bound, because the
//! `sqlite3` shell backend only accepts plain text. Every string goes through
//! [`quote`].

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::record::{frontmatter_text, NoteRecord};

/// One-to-many relation owned by a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Tags,
    Frontmatter,
}

impl RelationKind {
    fn table(self) -> &'static str {
        match self {
            RelationKind::Tags => "note_tag",
            RelationKind::Frontmatter => "note_frontmatter",
        }
    }

    fn columns(self) -> &'static str {
        match self {
            RelationKind::Tags => "note_path, tag_name, tag_name_lower",
            RelationKind::Frontmatter => {
                "note_path, frontmatter_name, frontmatter_name_lower, frontmatter_value, frontmatter_value_lower"
            }
        }
    }
}

/// Quote a string as an SQL literal, doubling embedded single quotes
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Keep only the last record for each path, in the order those last
/// occurrences appear.
pub fn dedupe_by_path(records: &[NoteRecord]) -> Vec<&NoteRecord> {
    let mut seen = HashSet::new();
    let mut kept: Vec<&NoteRecord> = records
        .iter()
        .rev()
        .filter(|r| seen.insert(r.path.as_str()))
        .collect();
    kept.reverse();
    kept
}

/// Stored form of a tag: trimmed, then one leading `#` removed. Empty tags
/// are dropped.
pub fn normalize_tag(tag: &str) -> Option<&str> {
    let tag = tag.trim();
    let name = tag.strip_prefix('#').unwrap_or(tag).trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn paths_in(records: &[&NoteRecord]) -> String {
    records
        .iter()
        .map(|r| quote(&r.path))
        .collect::<Vec<_>>()
        .join(", ")
}

fn relation_values(record: &NoteRecord, kind: RelationKind) -> Vec<String> {
    let path = quote(&record.path);
    match kind {
        RelationKind::Tags => record
            .tags
            .iter()
            .filter_map(|t| normalize_tag(t))
            .map(|name| {
                format!(
                    "({}, {}, {})",
                    path,
                    quote(name),
                    quote(&name.to_lowercase())
                )
            })
            .collect(),
        RelationKind::Frontmatter => record
            .frontmatter
            .iter()
            .map(|(name, value)| {
                let text = frontmatter_text(value);
                format!(
                    "({}, {}, {}, {}, {})",
                    path,
                    quote(name),
                    quote(&name.to_lowercase()),
                    quote(&text),
                    quote(&text.to_lowercase())
                )
            })
            .collect(),
    }
}

fn upsert_for(records: &[&NoteRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let values = records
        .iter()
        .map(|r| {
            format!(
                "({}, {}, {}, {}, {}, {})",
                quote(&r.path),
                quote(&r.title),
                quote(&r.title.to_lowercase()),
                quote(&r.content),
                r.created,
                r.last_modified
            )
        })
        .collect::<Vec<_>>()
        .join(",\n    ");

    Some(format!(
        "INSERT INTO note (path, title, title_lower, content_lower, created, last_modified)\n\
         VALUES\n    {values}\n\
         ON CONFLICT(path) DO UPDATE SET\n    \
         title = excluded.title,\n    \
         title_lower = excluded.title_lower,\n    \
         content_lower = excluded.content_lower,\n    \
         created = excluded.created,\n    \
         last_modified = excluded.last_modified;"
    ))
}

fn relation_replace_for(records: &[&NoteRecord], kind: RelationKind) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let mut sql = format!(
        "DELETE FROM {} WHERE note_path IN ({});",
        kind.table(),
        paths_in(records)
    );

    let values: Vec<String> = records
        .iter()
        .flat_map(|r| relation_values(r, kind))
        .collect();

    if !values.is_empty() {
        let _ = write!(
            sql,
            "\nINSERT OR IGNORE INTO {} ({})\nVALUES\n    {};",
            kind.table(),
            kind.columns(),
            values.join(",\n    ")
        );
    }

    Some(sql)
}

/// Multi-row upsert of note rows keyed on `path`.
///
/// An existing `last_opened` value survives the update.
pub fn build_upsert(records: &[NoteRecord]) -> Option<String> {
    upsert_for(&dedupe_by_path(records))
}

/// Delete every relation row of the batch's paths, then insert the current
/// set. The insert is omitted when the batch has no rows of this kind.
pub fn build_relation_replace(records: &[NoteRecord], kind: RelationKind) -> Option<String> {
    relation_replace_for(&dedupe_by_path(records), kind)
}

/// Full update of a batch as one transaction: notes, then tags, then
/// frontmatter. Returns `None` for an empty batch.
pub fn build_update_script(records: &[NoteRecord]) -> Option<String> {
    let batch = dedupe_by_path(records);
    let upsert = upsert_for(&batch)?;

    let mut script = String::from("BEGIN;\n");
    script.push_str(&upsert);
    for kind in [RelationKind::Tags, RelationKind::Frontmatter] {
        if let Some(sql) = relation_replace_for(&batch, kind) {
            script.push('\n');
            script.push_str(&sql);
        }
    }
    script.push_str("\nCOMMIT;");
    Some(script)
}

/// Delete one note. Relation rows go with it through `ON DELETE CASCADE`.
pub fn build_delete(path: &str) -> String {
    format!("DELETE FROM note WHERE path = {};", quote(path))
}

/// Set `last_opened` to the current time in milliseconds
pub fn build_touch_last_opened(path: &str) -> String {
    build_touch_last_opened_at(path, chrono::Utc::now().timestamp_millis())
}

pub fn build_touch_last_opened_at(path: &str, now_ms: i64) -> String {
    format!(
        "UPDATE note SET last_opened = {} WHERE path = {};",
        now_ms,
        quote(path)
    )
}

pub fn build_select_note(path: &str) -> String {
    format!(
        "SELECT path, title, title_lower, content_lower, created, last_modified, last_opened \
         FROM note WHERE path = {};",
        quote(path)
    )
}

pub fn build_select_tags(path: &str) -> String {
    format!(
        "SELECT tag_name, tag_name_lower FROM note_tag WHERE note_path = {} \
         ORDER BY tag_name_lower;",
        quote(path)
    )
}

pub fn build_select_frontmatter(path: &str) -> String {
    format!(
        "SELECT frontmatter_name, frontmatter_name_lower, frontmatter_value, frontmatter_value_lower \
         FROM note_frontmatter WHERE note_path = {} ORDER BY frontmatter_name_lower;",
        quote(path)
    )
}

pub fn build_count_notes() -> &'static str {
    "SELECT COUNT(*) AS count FROM note;"
}
