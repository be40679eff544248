//! Migration trait and registry.

use futures::future::BoxFuture;

use crate::config::MigrationConfig;
use crate::error::AppError;
use crate::migrations::MigrationReport;
use crate::store::DocumentStore;

// =============================================================================
// Migration Context
// =============================================================================

/// Everything a migration needs for one run.
pub struct MigrationContext<'a> {
    pub store: &'a dyn DocumentStore,
    pub config: &'a MigrationConfig,
    /// Compute results without writing anything.
    pub dry_run: bool,
}

// =============================================================================
// Migration Trait
// =============================================================================

/// A one-shot data migration.
/// Uses BoxFuture so the trait stays object-safe without `'static` bounds.
pub trait Migration: Send + Sync {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn up<'a>(
        &'a self,
        ctx: &'a MigrationContext<'a>,
    ) -> BoxFuture<'a, Result<MigrationReport, AppError>>;
}

// =============================================================================
// Migration Registry
// =============================================================================

/// Ordered set of migrations, run in registration order.
pub struct Register {
    migrations: Vec<Box<dyn Migration>>,
}

impl Register {
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    pub fn register(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    /// Iterate over migrations.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    /// Look up a migration by id.
    pub fn get(&self, id: &str) -> Option<&dyn Migration> {
        self.iter().find(|m| m.id() == id)
    }

    /// Runs each migration in turn, stopping at the first failure.
    pub async fn run_all(&self, ctx: &MigrationContext<'_>) -> Result<Vec<MigrationReport>, AppError> {
        let mut reports = Vec::with_capacity(self.migrations.len());
        for migration in self.iter() {
            reports.push(run_one(migration, ctx).await?);
        }
        Ok(reports)
    }
}

impl Default for Register {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a single migration with start/failure logging.
pub async fn run_one(
    migration: &dyn Migration,
    ctx: &MigrationContext<'_>,
) -> Result<MigrationReport, AppError> {
    tracing::info!(
        "Applying migration {}{}: {}",
        migration.id(),
        if ctx.dry_run { " (dry run)" } else { "" },
        migration.description()
    );

    match migration.up(ctx).await {
        Ok(report) => Ok(report),
        Err(e) => {
            tracing::error!("Migration {} failed: {}", migration.id(), e);
            Err(e)
        }
    }
}
