//! Application context shared by CLI commands.

use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::store::backends::postgres::PostgresStore;
use crate::store::DocumentStore;

/// Root application context.
///
/// Holds the configured document store and configuration. Commands build one
/// at startup and borrow from it for the rest of the run.
#[derive(Clone)]
pub struct Context {
    /// Document store all migrations read from and write to.
    pub store: Arc<dyn DocumentStore>,
    /// Application configuration.
    pub config: Arc<Config>,
}

impl Context {
    /// Creates a context around an existing store.
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Connects the configured PostgreSQL store and builds the context.
    pub async fn from(config: Config) -> Result<Self, AppError> {
        tracing::info!(
            project_id = %config.database.project_id,
            endpoint = %config.database.endpoint,
            "Connecting to document store"
        );
        let store = PostgresStore::connect(&config.database).await?;
        Ok(Self::new(Arc::new(store), config))
    }
}
