//! Init command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::store::backends::postgres::PostgresStore;

use super::App;

impl App {
    /// Create the `documents` table if it does not exist.
    pub async fn run_init(&self) -> Result<()> {
        let config = Config::load()?;
        tracing::info!(
            "Loaded configuration for project: {}",
            config.database.project_id
        );

        let store = PostgresStore::connect(&config.database)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;

        tracing::info!("Ensuring document table exists...");
        store
            .ensure_schema()
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create schema: {}", e))?;

        tracing::info!("Document store ready");
        Ok(())
    }
}
