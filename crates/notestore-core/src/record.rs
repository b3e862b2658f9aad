//! Note records exchanged with collaborators
//!
//! `NoteRecord` is the normalized input produced by the host application
//! (content already lower-cased and stopword-filtered). The `Stored*` types
//! are rows read back from the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bail_invalid;
use crate::error::Result;

/// A normalized note as handed to the store adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Unique key of the note
    pub path: String,
    pub title: String,
    /// Searchable text, already normalized by the caller
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub frontmatter: BTreeMap<String, Value>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub last_modified: i64,
}

impl NoteRecord {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            content: String::new(),
            tags: Vec::new(),
            frontmatter: BTreeMap::new(),
            created: 0,
            last_modified: 0,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_frontmatter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.frontmatter.insert(key.into(), value.into());
        self
    }

    pub fn with_timestamps(mut self, created: i64, last_modified: i64) -> Self {
        self.created = created;
        self.last_modified = last_modified;
        self
    }

    /// Reject records the store cannot key or hold. The engine's SQL
    /// tokenizer stops at NUL, so no stored text may contain one.
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            bail_invalid!("note path", "(empty)");
        }
        if self.path.contains('\0') {
            bail_invalid!("note path", self.path.escape_default());
        }
        if self.title.contains('\0') {
            bail_invalid!("note title", self.path.escape_default());
        }
        if self.content.contains('\0') {
            bail_invalid!("note content", self.path.escape_default());
        }
        if let Some(tag) = self.tags.iter().find(|t| t.contains('\0')) {
            bail_invalid!("note tag", tag.escape_default());
        }
        for (name, value) in &self.frontmatter {
            if name.contains('\0') || frontmatter_text(value).contains('\0') {
                bail_invalid!("frontmatter field", name.escape_default());
            }
        }
        Ok(())
    }
}

/// Text stored for a frontmatter value: strings verbatim, anything else as
/// compact JSON.
pub fn frontmatter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse one record or an array of records from JSON text
pub fn parse_records(json: &str) -> Result<Vec<NoteRecord>> {
    let value: Value = serde_json::from_str(json)?;
    let records = match value {
        Value::Array(_) => serde_json::from_value::<Vec<NoteRecord>>(value)?,
        other => vec![serde_json::from_value::<NoteRecord>(other)?],
    };
    for record in &records {
        record.validate()?;
    }
    Ok(records)
}

/// A note row as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNote {
    pub path: String,
    pub title: String,
    pub title_lower: String,
    pub content_lower: String,
    pub created: i64,
    pub last_modified: i64,
    pub last_opened: Option<i64>,
}

/// A tag membership row as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTag {
    pub tag_name: String,
    pub tag_name_lower: String,
}

/// A frontmatter row as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFrontmatter {
    pub frontmatter_name: String,
    pub frontmatter_name_lower: String,
    pub frontmatter_value: String,
    pub frontmatter_value_lower: String,
}
