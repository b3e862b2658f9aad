//! Schema version detection and upgrade

use serde::Serialize;

use super::executor::{CommandExecutor, RunOptions};
use super::schema::{MigrationPlan, SELECT_VERSION_SQL};
use crate::error::{Result, StoreError};

/// What `ensure_schema` did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaStatus {
    /// No readable version; the schema was built from scratch
    Created,
    /// The store was too old (or too new) to migrate and was rebuilt
    Reset,
    /// Migration steps were applied
    Upgraded,
    /// Already at the current version
    Current,
}

impl std::fmt::Display for SchemaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaStatus::Created => write!(f, "created"),
            SchemaStatus::Reset => write!(f, "reset"),
            SchemaStatus::Upgraded => write!(f, "upgraded"),
            SchemaStatus::Current => write!(f, "current"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub status: SchemaStatus,
    pub from_version: Option<i64>,
    pub to_version: i64,
}

#[derive(serde::Deserialize)]
struct VersionRow {
    version: i64,
}

/// Read the stored schema version.
///
/// `Ok(None)` means the version table is missing, empty or unreadable.
/// Timeouts are not treated as unreadable: they are passed through.
pub fn read_version(executor: &mut dyn CommandExecutor, timeout: std::time::Duration) -> Result<Option<i64>> {
    let output = match executor.run(SELECT_VERSION_SQL, &RunOptions::structured(timeout)) {
        Ok(output) => output,
        Err(e @ StoreError::Timeout { .. }) => return Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "schema version unreadable");
            return Ok(None);
        }
    };

    match output.decode::<VersionRow>() {
        Ok(rows) => Ok(rows.first().map(|r| r.version)),
        Err(e) => {
            tracing::debug!(error = %e, "schema version row malformed");
            Ok(None)
        }
    }
}

/// Bring the store to `plan.current_version()`.
///
/// Runs before any queued traffic exists, so it calls the executor directly.
pub fn ensure_schema(
    executor: &mut dyn CommandExecutor,
    plan: &MigrationPlan,
    timeout: std::time::Duration,
) -> Result<SchemaReport> {
    let target = plan.current_version();
    let options = RunOptions::text(timeout);
    let found = read_version(executor, timeout)?;

    let status = match found {
        None => {
            tracing::info!(version = target, "creating store schema");
            executor.run(&plan.reset_script(), &options)?;
            SchemaStatus::Created
        }
        Some(v) if v == target => SchemaStatus::Current,
        Some(v) if v < plan.min_version() || v > target => {
            tracing::info!(
                from = v,
                to = target,
                "store schema cannot be migrated, resetting"
            );
            executor.run(&plan.reset_script(), &options)?;
            SchemaStatus::Reset
        }
        Some(v) => {
            for step in plan.steps_after(v) {
                tracing::info!(version = step.version, "applying schema migration");
                executor.run(&plan.step_script(step), &options)?;
            }
            tracing::info!(from = v, to = target, "store schema upgraded");
            SchemaStatus::Upgraded
        }
    };

    Ok(SchemaReport {
        status,
        from_version: found,
        to_version: target,
    })
}
