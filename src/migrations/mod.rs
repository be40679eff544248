//! One-shot data migrations from the legacy progress schema.
//!
//! Migrations are:
//! - **Best-effort**: no transactions, no rollback. A failing write aborts the
//!   run and everything written before it stays written.
//! - **Re-runnable**: outputs are computed deterministically and merge-written
//!   at stable keys, so running again over an unchanged source rewrites the
//!   same documents.
//! - **Untracked**: no version table or completion marker is kept.
//! - **Non-destructive**: source collections are only read.

mod m001_user_course_progress;
mod runner;
mod traits;

pub use m001_user_course_progress::M001UserCourseProgress;
pub use runner::{create_register, run_migrations, RunOptions};
pub use traits::{run_one, Migration, MigrationContext, Register};

/// Outcome of one migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub migration_id: String,
    /// Legacy progress documents read.
    pub legacy_records: usize,
    /// Tracking documents read.
    pub tracking_entries: usize,
    /// Legacy documents skipped for missing identifiers.
    pub skipped_legacy: usize,
    /// Tracking documents skipped for missing identifiers.
    pub skipped_tracking: usize,
    /// Legacy documents that replaced an earlier document with the same key.
    pub duplicate_keys: usize,
    /// Keys present only in tracking data, left unmigrated.
    pub unmatched_keys: usize,
    /// Documents written (or, in a dry run, that would have been written).
    pub migrated: usize,
    pub dry_run: bool,
}

impl MigrationReport {
    pub fn new(migration_id: &str, dry_run: bool) -> Self {
        Self {
            migration_id: migration_id.to_string(),
            legacy_records: 0,
            tracking_entries: 0,
            skipped_legacy: 0,
            skipped_tracking: 0,
            duplicate_keys: 0,
            unmatched_keys: 0,
            migrated: 0,
            dry_run,
        }
    }
}
