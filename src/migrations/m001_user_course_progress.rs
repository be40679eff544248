//! Flattens legacy course progress into `userCourseProgress`.
//!
//! Reads the legacy per-course progress collection and the per-chapter
//! tracking collection in full, joins them on `"{userId}_{courseId}"`, and
//! merge-writes one record per legacy progress key.
//!
//! The legacy progress collection decides which pairs exist: a pair that only
//! has tracking rows is counted and logged but never migrated.

use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt, TryStreamExt};

use crate::error::AppError;
use crate::migrations::{Migration, MigrationContext, MigrationReport};
use crate::models::CourseProgress;
use crate::repositories::ProgressRepository;
use crate::services::merge::merge_course_progress;

pub struct M001UserCourseProgress;

impl M001UserCourseProgress {
    async fn migrate(&self, ctx: &MigrationContext<'_>) -> Result<MigrationReport, AppError> {
        let repo = ProgressRepository::new(ctx.store, ctx.config);
        let mut report = MigrationReport::new(self.id(), ctx.dry_run);

        let legacy = repo.load_legacy_progress().await?;
        let tracking = repo.load_tracking_entries().await?;

        report.legacy_records = legacy.total;
        report.tracking_entries = tracking.total;
        report.skipped_legacy = legacy.skipped;
        report.skipped_tracking = tracking.skipped;
        report.duplicate_keys = legacy.duplicates;
        report.unmatched_keys = tracking
            .groups
            .keys()
            .filter(|key| !legacy.records.contains_key(key.as_str()))
            .count();

        if report.unmatched_keys > 0 {
            tracing::info!(
                unmatched = report.unmatched_keys,
                "Pairs with tracking rows but no legacy progress are not migrated"
            );
        }

        let merged: Vec<CourseProgress> = legacy
            .records
            .iter()
            .map(|(key, progress)| merge_course_progress(progress, tracking.entries_for(key)))
            .collect();

        report.migrated = if ctx.dry_run {
            for progress in &merged {
                tracing::debug!(
                    key = %progress.key(),
                    document = %serde_json::to_string(progress)?,
                    "Would migrate course progress"
                );
            }
            merged.len()
        } else {
            write_all(&repo, &merged, ctx.config.write_concurrency).await?
        };

        tracing::info!(
            migrated = report.migrated,
            dry_run = ctx.dry_run,
            "Course progress migration complete"
        );
        Ok(report)
    }
}

fn save<'r>(
    repo: &'r ProgressRepository<'_>,
    progress: &'r CourseProgress,
) -> BoxFuture<'r, Result<&'r CourseProgress, AppError>> {
    async move {
        repo.save_course_progress(progress).await?;
        Ok(progress)
    }
    .boxed()
}

/// Merge-writes every record, at most `concurrency` at a time.
///
/// Completions are logged in input order. The first failure stops the run;
/// writes that already finished stay committed, and writes not yet started
/// are dropped.
async fn write_all(
    repo: &ProgressRepository<'_>,
    merged: &[CourseProgress],
    concurrency: usize,
) -> Result<usize, AppError> {
    // Collected before streaming so the boxed `up` future stays `Send`.
    let pending: Vec<_> = merged.iter().map(|progress| save(repo, progress)).collect();
    let mut writes = stream::iter(pending).buffered(concurrency.max(1));

    let mut written = 0;
    loop {
        match writes.try_next().await {
            Ok(Some(progress)) => {
                written += 1;
                tracing::info!(key = %progress.key(), written, "Migrated course progress");
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!(
                    written,
                    remaining = merged.len() - written,
                    error = %e,
                    "Aborting migration, earlier writes remain committed"
                );
                return Err(e);
            }
        }
    }

    Ok(written)
}

impl Migration for M001UserCourseProgress {
    fn id(&self) -> &'static str {
        "m001_user_course_progress"
    }

    fn description(&self) -> &'static str {
        "Merge userProgress and progress_tracking into userCourseProgress"
    }

    fn up<'a>(
        &'a self,
        ctx: &'a MigrationContext<'a>,
    ) -> BoxFuture<'a, Result<MigrationReport, AppError>> {
        async move { self.migrate(ctx).await }.boxed()
    }
}
