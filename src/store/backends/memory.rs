//! In-memory document store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::store::{Document, DocumentStore};

type Collection = BTreeMap<String, Map<String, JsonValue>>;

/// Document store held entirely in memory.
///
/// Collections and documents are kept in `BTreeMap`s so reads come back in
/// key order, matching the PostgreSQL backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the document at `key` wholesale.
    pub async fn insert(&self, collection: &str, key: &str, data: Map<String, JsonValue>) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), data);
    }

    /// Returns a copy of one document, if present.
    pub async fn get(&self, collection: &str, key: &str) -> Option<Document> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.get(key))
            .map(|data| Document::new(key, data.clone()))
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.len())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_where(
        &self,
        collection: &str,
        field: &str,
        value: &JsonValue,
    ) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .filter(|(_, data)| data.get(field) == Some(value))
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert_merge(
        &self,
        collection: &str,
        key: &str,
        fields: &Map<String, JsonValue>,
    ) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .entry(collection.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default();

        for (name, value) in fields {
            existing.insert(name.clone(), value.clone());
        }

        Ok(())
    }
}
