//! SQLite database schema for notestore

use std::collections::BTreeSet;

use crate::error::{Result, StoreError};

/// Schema version written by this build
pub const CURRENT_VERSION: i64 = 4;

/// Oldest schema version migrations are written for. Older stores are reset.
pub const MIN_MIGRATION_VERSION: i64 = 2;

/// Full current schema, used for fresh stores and resets
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS note (
    path TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    title_lower TEXT NOT NULL,
    content_lower TEXT NOT NULL DEFAULT '',
    created INTEGER NOT NULL DEFAULT 0,
    last_modified INTEGER NOT NULL DEFAULT 0,
    last_opened INTEGER
);
CREATE INDEX IF NOT EXISTS idx_note_title_lower ON note(title_lower);

-- Legacy tag list, no longer written
CREATE TABLE IF NOT EXISTS tag (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS note_tag (
    note_path TEXT NOT NULL REFERENCES note(path) ON DELETE CASCADE,
    tag_name TEXT NOT NULL,
    tag_name_lower TEXT NOT NULL,
    PRIMARY KEY (note_path, tag_name_lower)
);
CREATE INDEX IF NOT EXISTS idx_note_tag_name ON note_tag(tag_name_lower);

CREATE TABLE IF NOT EXISTS note_frontmatter (
    note_path TEXT NOT NULL REFERENCES note(path) ON DELETE CASCADE,
    frontmatter_name TEXT NOT NULL,
    frontmatter_name_lower TEXT NOT NULL,
    frontmatter_value TEXT NOT NULL,
    frontmatter_value_lower TEXT NOT NULL,
    PRIMARY KEY (note_path, frontmatter_name_lower)
);
CREATE INDEX IF NOT EXISTS idx_note_frontmatter_name
    ON note_frontmatter(frontmatter_name_lower, frontmatter_value_lower);
"#;

/// Children before parents, so cascades have nothing left to do
const DROP_ALL_SQL: &str = r#"
DROP TABLE IF EXISTS note_frontmatter;
DROP TABLE IF EXISTS note_tag;
DROP TABLE IF EXISTS tag;
DROP TABLE IF EXISTS note;
DROP TABLE IF EXISTS version;
"#;

/// A one-time schema change that takes a store from `version - 1` to
/// `version`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: i64,
    pub sql: &'static str,
}

/// Migrations shipped with this build
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 3,
        sql: "ALTER TABLE note ADD COLUMN last_opened INTEGER;",
    },
    Migration {
        version: 4,
        sql: r#"
CREATE TABLE IF NOT EXISTS note_frontmatter (
    note_path TEXT NOT NULL REFERENCES note(path) ON DELETE CASCADE,
    frontmatter_name TEXT NOT NULL,
    frontmatter_name_lower TEXT NOT NULL,
    frontmatter_value TEXT NOT NULL,
    frontmatter_value_lower TEXT NOT NULL,
    PRIMARY KEY (note_path, frontmatter_name_lower)
);
CREATE INDEX IF NOT EXISTS idx_note_frontmatter_name
    ON note_frontmatter(frontmatter_name_lower, frontmatter_value_lower);
CREATE INDEX IF NOT EXISTS idx_note_title_lower ON note(title_lower);
CREATE INDEX IF NOT EXISTS idx_note_tag_name ON note_tag(tag_name_lower);
"#,
    },
];

/// Validated set of schema scripts for one target version.
///
/// Construction fails if any version in `min + 1 ..= current` has no
/// migration, so a gap is caught before the store is touched.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    min_version: i64,
    current_version: i64,
    create_sql: &'static str,
    steps: Vec<Migration>,
}

impl MigrationPlan {
    pub fn new(
        min_version: i64,
        current_version: i64,
        create_sql: &'static str,
        migrations: &[Migration],
    ) -> Result<Self> {
        if min_version < 1 || current_version < min_version {
            return Err(StoreError::InvalidMigrations {
                reason: format!(
                    "version range {}..={} is empty or starts below 1",
                    min_version, current_version
                ),
            });
        }

        let mut seen = BTreeSet::new();
        for m in migrations {
            if m.version <= min_version || m.version > current_version {
                return Err(StoreError::InvalidMigrations {
                    reason: format!(
                        "migration {} is outside the supported range {}..={}",
                        m.version,
                        min_version + 1,
                        current_version
                    ),
                });
            }
            if !seen.insert(m.version) {
                return Err(StoreError::InvalidMigrations {
                    reason: format!("migration {} is registered twice", m.version),
                });
            }
        }

        if let Some(version) = (min_version + 1..=current_version).find(|v| !seen.contains(v)) {
            return Err(StoreError::MissingMigration { version });
        }

        let mut steps = migrations.to_vec();
        steps.sort_by_key(|m| m.version);

        Ok(Self {
            min_version,
            current_version,
            create_sql,
            steps,
        })
    }

    /// Plan for the schema compiled into this build
    pub fn current() -> Result<Self> {
        Self::new(
            MIN_MIGRATION_VERSION,
            CURRENT_VERSION,
            SCHEMA_SQL,
            MIGRATIONS,
        )
    }

    pub fn min_version(&self) -> i64 {
        self.min_version
    }

    pub fn current_version(&self) -> i64 {
        self.current_version
    }

    /// Steps that take a store at `from` to the current version, ascending
    pub fn steps_after(&self, from: i64) -> impl Iterator<Item = &Migration> {
        self.steps.iter().filter(move |m| m.version > from)
    }

    /// Drop everything and build the current schema as one transaction
    pub fn reset_script(&self) -> String {
        format!(
            "BEGIN;\n{}\n{}\n{}\nCOMMIT;",
            DROP_ALL_SQL.trim(),
            self.create_sql.trim(),
            set_version_sql(self.current_version)
        )
    }

    /// Apply one migration and record its version as one transaction
    pub fn step_script(&self, step: &Migration) -> String {
        format!(
            "BEGIN;\n{}\n{}\nCOMMIT;",
            step.sql.trim(),
            set_version_sql(step.version)
        )
    }
}

pub fn set_version_sql(version: i64) -> String {
    format!(
        "INSERT INTO version (id, version) VALUES (1, {0}) \
         ON CONFLICT(id) DO UPDATE SET version = {0};",
        version
    )
}

pub const SELECT_VERSION_SQL: &str = "SELECT version FROM version WHERE id = 1;";

/// Schema as shipped at `MIN_MIGRATION_VERSION`, for exercising upgrades
#[cfg(test)]
pub(crate) const SCHEMA_V2_SQL: &str = r#"
CREATE TABLE version (id INTEGER PRIMARY KEY CHECK (id = 1), version INTEGER NOT NULL);
CREATE TABLE note (
    path TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    title_lower TEXT NOT NULL,
    content_lower TEXT NOT NULL DEFAULT '',
    created INTEGER NOT NULL DEFAULT 0,
    last_modified INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE tag (name TEXT PRIMARY KEY);
CREATE TABLE note_tag (
    note_path TEXT NOT NULL REFERENCES note(path) ON DELETE CASCADE,
    tag_name TEXT NOT NULL,
    tag_name_lower TEXT NOT NULL,
    PRIMARY KEY (note_path, tag_name_lower)
);
INSERT INTO version (id, version) VALUES (1, 2);
"#;
