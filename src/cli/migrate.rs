//! Migrate command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::migrations::{run_migrations, RunOptions};

use super::App;

impl App {
    /// Run the data migrations against the configured store.
    pub async fn run_migrate(&self, dry_run: bool, only: Option<String>) -> Result<()> {
        let config = Config::load()?;
        tracing::info!(
            project_id = %config.database.project_id,
            source = %config.migration.legacy_progress_collection,
            tracking = %config.migration.tracking_collection,
            destination = %config.migration.destination_collection,
            write_concurrency = config.migration.write_concurrency,
            "Loaded configuration"
        );

        let ctx = Context::from(config).await?;
        let options = RunOptions { dry_run, only };

        let reports = run_migrations(ctx.store.as_ref(), &ctx.config.migration, &options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Migration failed");
                color_eyre::eyre::eyre!("Migration failed: {}", e)
            })?;

        for report in &reports {
            tracing::info!(
                migration = %report.migration_id,
                migrated = report.migrated,
                legacy_records = report.legacy_records,
                tracking_entries = report.tracking_entries,
                skipped_legacy = report.skipped_legacy,
                skipped_tracking = report.skipped_tracking,
                duplicates = report.duplicate_keys,
                unmatched = report.unmatched_keys,
                dry_run = report.dry_run,
                "Migration finished"
            );
        }

        let total: usize = reports.iter().map(|r| r.migrated).sum();
        if dry_run {
            println!("Dry run complete: {} record(s) would be migrated", total);
        } else {
            println!("Migration complete: {} record(s) migrated", total);
        }

        Ok(())
    }
}
