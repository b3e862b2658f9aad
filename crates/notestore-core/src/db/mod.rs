//! SQLite store adapter for notestore

pub mod executor;
pub mod queue;
pub mod schema;
pub mod statements;
pub mod version;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::map_db_err;
use crate::record::{NoteRecord, StoredFrontmatter, StoredNote, StoredTag};

pub use executor::{
    open_executor, CliExecutor, CommandExecutor, EmbeddedExecutor, ExecOutput, ResultMode,
    RunOptions,
};
pub use queue::{Pending, QueueStats, WriteQueue};
pub use schema::{MigrationPlan, CURRENT_VERSION, MIN_MIGRATION_VERSION};
pub use statements::RelationKind;
pub use version::{SchemaReport, SchemaStatus};

/// Persistent note index.
///
/// All engine calls, writes and lookups alike, go through one [`WriteQueue`]
/// and complete in the order they were issued.
pub struct NoteIndex {
    queue: WriteQueue,
    timeout: Duration,
    store_path: Option<PathBuf>,
    schema: Option<SchemaReport>,
}

#[derive(serde::Deserialize)]
struct CountRow {
    count: i64,
}

impl NoteIndex {
    /// Open the store named by `config`, bring its schema up to date and
    /// start the write queue.
    ///
    /// A store file the engine rejects outright is deleted and created
    /// again; the index can be rebuilt from the notes themselves.
    pub fn initialize(config: &StoreConfig) -> Result<Self> {
        let store_path = config.require_store_path(None)?.to_path_buf();
        let plan = MigrationPlan::current()?;

        let (executor, schema) = match Self::prepare(config, &store_path, &plan) {
            Ok(prepared) => prepared,
            Err(e) if e.is_corruption() && store_path.exists() => {
                tracing::error!(
                    "Store corruption detected at {}: {}. Recreating...",
                    store_path.display(),
                    e
                );
                remove_store_files(&store_path)?;
                Self::prepare(config, &store_path, &plan).map_err(|rebuild_err| {
                    StoreError::InvalidStore {
                        reason: format!(
                            "failed to recreate store after corruption: {} (original error: {})",
                            rebuild_err, e
                        ),
                    }
                })?
            }
            Err(e) => return Err(e),
        };

        let mut index = Self::start(executor, schema, config.timeout())?;
        index.store_path = Some(store_path);
        Ok(index)
    }

    /// Start an index over an already opened executor, checking the schema
    /// against `plan` first unless `config.skip_schema_check` is set
    pub fn with_executor(
        mut executor: Box<dyn CommandExecutor>,
        plan: &MigrationPlan,
        config: &StoreConfig,
    ) -> Result<Self> {
        let schema = if config.skip_schema_check {
            None
        } else {
            Some(version::ensure_schema(
                executor.as_mut(),
                plan,
                config.timeout(),
            )?)
        };
        Self::start(executor, schema, config.timeout())
    }

    fn prepare(
        config: &StoreConfig,
        store_path: &Path,
        plan: &MigrationPlan,
    ) -> Result<(Box<dyn CommandExecutor>, Option<SchemaReport>)> {
        let mut executor = open_executor(config, store_path)?;
        if config.skip_schema_check {
            tracing::debug!("schema check skipped");
            return Ok((executor, None));
        }
        let report = version::ensure_schema(executor.as_mut(), plan, config.timeout())?;
        Ok((executor, Some(report)))
    }

    fn start(
        executor: Box<dyn CommandExecutor>,
        schema: Option<SchemaReport>,
        timeout: Duration,
    ) -> Result<Self> {
        if let Some(report) = &schema {
            tracing::debug!(
                status = %report.status,
                from = ?report.from_version,
                to = report.to_version,
                "schema ready"
            );
        }
        Ok(Self {
            queue: WriteQueue::start(executor)?,
            timeout,
            store_path: None,
            schema,
        })
    }

    /// What startup did to the schema; `None` when the check was skipped
    pub fn schema_report(&self) -> Option<&SchemaReport> {
        self.schema.as_ref()
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    /// Upsert one note together with its tags and frontmatter
    pub fn update_note(&self, record: NoteRecord) -> Pending<()> {
        self.update_notes(vec![record])
    }

    /// Upsert a batch of notes as one engine call. For a path that appears
    /// more than once, the last record wins.
    pub fn update_notes(&self, records: Vec<NoteRecord>) -> Pending<()> {
        if let Err(e) = records.iter().try_for_each(NoteRecord::validate) {
            return Pending::ready(Err(e));
        }
        let Some(script) = statements::build_update_script(&records) else {
            return Pending::ready(Ok(()));
        };

        let options = RunOptions::text(self.timeout);
        let count = statements::dedupe_by_path(&records).len();
        self.queue.enqueue(move |executor| {
            executor.run(&script, &options)?;
            tracing::debug!(count, "notes updated");
            Ok(())
        })
    }

    /// Delete a note; its tags and frontmatter cascade
    pub fn delete_note(&self, path: &str) -> Pending<()> {
        self.write(statements::build_delete(path), "note deleted", path)
    }

    /// Stamp a note's `last_opened` with the current time
    pub fn update_last_opened(&self, path: &str) -> Pending<()> {
        self.write(
            statements::build_touch_last_opened(path),
            "last opened updated",
            path,
        )
    }

    fn write(&self, script: String, message: &'static str, path: &str) -> Pending<()> {
        let options = RunOptions::text(self.timeout);
        let path = path.to_string();
        self.queue.enqueue(move |executor| {
            executor.run(&script, &options)?;
            tracing::debug!(path = %path, "{}", message);
            Ok(())
        })
    }

    fn query<T>(&self, script: String) -> Pending<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let options = RunOptions::structured(self.timeout);
        self.queue
            .enqueue(move |executor| executor.run(&script, &options)?.decode::<T>())
    }

    pub fn get_note(&self, path: &str) -> Result<Option<StoredNote>> {
        let rows = self.query::<StoredNote>(statements::build_select_note(path)).wait()?;
        Ok(rows.into_iter().next())
    }

    /// Tags of a note, ordered by their lower-cased name
    pub fn tags_for(&self, path: &str) -> Result<Vec<StoredTag>> {
        self.query(statements::build_select_tags(path)).wait()
    }

    /// Frontmatter of a note, ordered by its lower-cased name
    pub fn frontmatter_for(&self, path: &str) -> Result<Vec<StoredFrontmatter>> {
        self.query(statements::build_select_frontmatter(path)).wait()
    }

    pub fn note_count(&self) -> Result<i64> {
        let rows = self
            .query::<CountRow>(statements::build_count_notes().to_string())
            .wait()?;
        Ok(rows.first().map_or(0, |r| r.count))
    }

    /// Schema version currently recorded in the store
    pub fn schema_version(&self) -> Result<Option<i64>> {
        let timeout = self.timeout;
        self.queue
            .enqueue(move |executor| version::read_version(executor, timeout))
            .wait()
    }

    /// Drain queued work and stop the worker
    pub fn shutdown(self) -> Result<QueueStats> {
        let stats = self.queue.shutdown()?;
        tracing::debug!(
            completed = stats.completed,
            failed = stats.failed,
            "note index shut down"
        );
        Ok(stats)
    }
}

/// Remove a store file and its WAL siblings
fn remove_store_files(store_path: &Path) -> Result<()> {
    std::fs::remove_file(store_path).map_err(|e| {
        map_db_err!(
            &format!("delete corrupted store {}", store_path.display()),
            e
        )
    })?;

    for suffix in ["-wal", "-shm"] {
        let mut sibling = store_path.as_os_str().to_owned();
        sibling.push(suffix);
        let _ = std::fs::remove_file(PathBuf::from(sibling));
    }

    tracing::info!("Deleted corrupted store at {}", store_path.display());
    Ok(())
}

#[cfg(test)]
mod tests;
