//! Migration runner.

use crate::config::MigrationConfig;
use crate::error::AppError;
use crate::migrations::{run_one, M001UserCourseProgress, MigrationContext, MigrationReport, Register};
use crate::store::DocumentStore;

/// Options controlling a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Compute results without writing.
    pub dry_run: bool,
    /// Run only the migration with this id.
    pub only: Option<String>,
}

/// Create the migrations register.
pub fn create_register() -> Register {
    Register::new().register(M001UserCourseProgress)
}

/// Run all registered migrations, or the one selected by `options.only`.
pub async fn run_migrations(
    store: &dyn DocumentStore,
    config: &MigrationConfig,
    options: &RunOptions,
) -> Result<Vec<MigrationReport>, AppError> {
    let register = create_register();
    let ctx = MigrationContext {
        store,
        config,
        dry_run: options.dry_run,
    };

    match &options.only {
        Some(id) => {
            let migration = register
                .get(id)
                .ok_or_else(|| AppError::UnknownMigration(id.clone()))?;
            Ok(vec![run_one(migration, &ctx).await?])
        }
        None => register.run_all(&ctx).await,
    }
}
