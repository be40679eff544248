//! PostgreSQL document store backend.
//!
//! Every collection lives in a single `documents` table, one JSONB row per
//! document, namespaced by project:
//!
//! ```sql
//! documents(project_id, collection, id, data JSONB, updated_at)
//! ```
//!
//! Merge-writes use JSONB concatenation (`data || EXCLUDED.data`), which
//! replaces the top-level keys being written and keeps the rest.
//!
//! # Example
//!
//! ```ignore
//! use coursekit_migrate::store::backends::postgres::PostgresStore;
//!
//! let store = PostgresStore::connect(&config.database).await?;
//! store.ensure_schema().await?;
//! let docs = store.get_all("userProgress").await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use serde_json::{Map, Value as JsonValue};
use tokio_postgres::{NoTls, Row};

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::store::{Document, DocumentStore};

const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    project_id TEXT NOT NULL,
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data JSONB NOT NULL DEFAULT '{}'::jsonb,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (project_id, collection, id)
);

CREATE INDEX IF NOT EXISTS documents_data_idx
ON documents USING gin (data jsonb_path_ops);
"#;

const SELECT_ALL: &str = "SELECT id, data FROM documents
     WHERE project_id = $1 AND collection = $2
     ORDER BY id";

const SELECT_WHERE: &str = "SELECT id, data FROM documents
     WHERE project_id = $1 AND collection = $2 AND data -> $3 = $4
     ORDER BY id";

const UPSERT_MERGE: &str = "INSERT INTO documents (project_id, collection, id, data, updated_at)
     VALUES ($1, $2, $3, $4, NOW())
     ON CONFLICT (project_id, collection, id)
     DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = NOW()";

/// PostgreSQL-backed document store.
///
/// Provides connection pooling via deadpool-postgres. Cheap to clone; the
/// pool is `Arc`-based.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
    project_id: Arc<str>,
}

impl PostgresStore {
    /// Creates a pooled store from the database configuration.
    ///
    /// `credentials`, when set, replaces any password in `endpoint`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let mut pg_config: tokio_postgres::Config = config.endpoint.parse().map_err(|e| {
            AppError::Validation(format!("Invalid PostgreSQL connection string: {}", e))
        })?;
        if let Some(password) = &config.credentials {
            pg_config.password(password.as_str());
        }

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(config.pool_size)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create connection pool: {}", e)))?;

        Ok(Self {
            pool,
            project_id: Arc::from(config.project_id.as_str()),
        })
    }

    /// Returns the project namespace this store reads and writes.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Creates the `documents` table and its index if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        let conn = self.get_connection().await?;
        conn.batch_execute(CREATE_DOCUMENTS_TABLE)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create schema: {}", describe(&e))))?;
        Ok(())
    }

    async fn get_connection(&self) -> Result<Object, AppError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        let conn = self
            .get_connection()
            .await
            .map_err(|e| AppError::read(collection, e))?;
        let rows = conn
            .query(SELECT_ALL, &[&&*self.project_id, &collection])
            .await
            .map_err(|e| AppError::read(collection, describe(&e)))?;

        rows.iter().map(|row| parse_row(collection, row)).collect()
    }

    async fn get_where(
        &self,
        collection: &str,
        field: &str,
        value: &JsonValue,
    ) -> Result<Vec<Document>, AppError> {
        let conn = self
            .get_connection()
            .await
            .map_err(|e| AppError::read(collection, e))?;
        let rows = conn
            .query(SELECT_WHERE, &[&&*self.project_id, &collection, &field, value])
            .await
            .map_err(|e| AppError::read(collection, describe(&e)))?;

        rows.iter().map(|row| parse_row(collection, row)).collect()
    }

    async fn upsert_merge(
        &self,
        collection: &str,
        key: &str,
        fields: &Map<String, JsonValue>,
    ) -> Result<(), AppError> {
        let conn = self
            .get_connection()
            .await
            .map_err(|e| AppError::write(collection, key, e))?;
        let data = JsonValue::Object(fields.clone());
        conn.execute(UPSERT_MERGE, &[&&*self.project_id, &collection, &key, &data])
            .await
            .map_err(|e| AppError::write(collection, key, describe(&e)))?;
        Ok(())
    }
}

fn parse_row(collection: &str, row: &Row) -> Result<Document, AppError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| AppError::read(collection, e))?;
    let data: JsonValue = row
        .try_get("data")
        .map_err(|e| AppError::read(collection, e))?;

    match data {
        JsonValue::Object(map) => Ok(Document::new(id, map)),
        other => Err(AppError::read(
            collection,
            format!("document '{}' is not a JSON object: {}", id, other),
        )),
    }
}

/// Extracts the detailed server-side message from a PostgreSQL error.
fn describe(err: &tokio_postgres::Error) -> String {
    err.as_db_error()
        .map(|db_err| {
            format!(
                "{}: {} ({}) (detail: {:?}, hint: {:?})",
                db_err.severity(),
                db_err.message(),
                db_err.code().code(),
                db_err.detail(),
                db_err.hint()
            )
        })
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_config(endpoint: &str) -> DatabaseConfig {
        DatabaseConfig {
            project_id: "acme".to_string(),
            endpoint: endpoint.to_string(),
            credentials: Some("secret".to_string()),
            pool_size: 2,
        }
    }

    #[tokio::test]
    async fn test_connect_builds_pool_lazily() {
        // deadpool opens connections on first use, so no server is needed here.
        let store = PostgresStore::connect(&database_config("postgresql://lms@localhost:5432/lms"))
            .await
            .expect("pool should build");
        assert_eq!(store.project_id(), "acme");
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_endpoint() {
        let result = PostgresStore::connect(&database_config("postgresql://lms@localhost:notaport/lms")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
