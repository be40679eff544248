//! Core trait for document database access.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::store::document::Document;

/// Reads and writes documents in named collections.
///
/// This is the only capability the migrations need from the database:
/// bulk reads, equality-filtered reads, and merge-writes. Backends decide
/// how collections are laid out physically.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches every document in a collection with a single bulk read.
    ///
    /// Results are not paginated; the whole collection is held in memory.
    /// Documents are returned in ascending key order.
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>, AppError>;

    /// Fetches the documents whose top-level `field` equals `value`.
    async fn get_where(
        &self,
        collection: &str,
        field: &str,
        value: &JsonValue,
    ) -> Result<Vec<Document>, AppError>;

    /// Creates the document at `key`, or merges `fields` into it.
    ///
    /// Top-level fields present in `fields` replace the stored values;
    /// every other stored field is left untouched.
    async fn upsert_merge(
        &self,
        collection: &str,
        key: &str,
        fields: &Map<String, JsonValue>,
    ) -> Result<(), AppError>;
}
