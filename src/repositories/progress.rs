//! Progress repository: reads the legacy collections and writes merged records.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::config::MigrationConfig;
use crate::error::AppError;
use crate::models::{CompositeKey, CourseProgress, LegacyUserProgress, ProgressTrackingEntry};
use crate::store::DocumentStore;

/// Legacy progress records keyed by destination document key.
///
/// Two pairs whose `"{userId}_{courseId}"` strings coincide (`("a_b", "c")`
/// and `("a", "b_c")`) share one slot and count as a duplicate.
#[derive(Debug, Default)]
pub struct LegacyProgressIndex {
    pub records: BTreeMap<String, LegacyUserProgress>,
    /// Documents read from the collection.
    pub total: usize,
    /// Documents without a usable user or course id.
    pub skipped: usize,
    /// Documents that replaced an earlier one with the same key.
    pub duplicates: usize,
}

/// Tracking rows grouped by destination document key.
#[derive(Debug, Default)]
pub struct TrackingIndex {
    pub groups: BTreeMap<String, Vec<ProgressTrackingEntry>>,
    /// Documents read from the collection.
    pub total: usize,
    /// Documents without a usable user or course id.
    pub skipped: usize,
}

impl TrackingIndex {
    /// Rows for a key; empty when the pair has no tracking data.
    pub fn entries_for(&self, key: &str) -> &[ProgressTrackingEntry] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Repository over the three progress collections.
pub struct ProgressRepository<'a> {
    store: &'a dyn DocumentStore,
    collections: &'a MigrationConfig,
}

impl<'a> ProgressRepository<'a> {
    pub fn new(store: &'a dyn DocumentStore, collections: &'a MigrationConfig) -> Self {
        Self { store, collections }
    }

    /// Loads the whole legacy progress collection.
    ///
    /// Duplicate keys resolve last-write-wins, with a warning per duplicate.
    pub async fn load_legacy_progress(&self) -> Result<LegacyProgressIndex, AppError> {
        let collection = &self.collections.legacy_progress_collection;
        let docs = self.store.get_all(collection).await?;

        let mut index = LegacyProgressIndex {
            total: docs.len(),
            ..Default::default()
        };

        for doc in &docs {
            let Some(progress) = LegacyUserProgress::from_document(doc) else {
                tracing::debug!(document = %doc.id, collection = %collection, "Skipping progress without user or course id");
                index.skipped += 1;
                continue;
            };

            let key = progress.key.to_string();
            let user = progress.key.user_id().to_string();
            let course = progress.key.course_id().to_string();
            if let Some(replaced) = index.records.insert(key.clone(), progress) {
                tracing::warn!(
                    key = %key,
                    document = %doc.id,
                    user = %user,
                    course = %course,
                    replaced_user = %replaced.key.user_id(),
                    replaced_course = %replaced.key.course_id(),
                    "Duplicate legacy progress key, keeping the later document"
                );
                index.duplicates += 1;
            }
        }

        tracing::info!(
            collection = %collection,
            total = index.total,
            usable = index.records.len(),
            skipped = index.skipped,
            duplicates = index.duplicates,
            "Loaded legacy progress"
        );
        Ok(index)
    }

    /// Loads the whole tracking collection and groups it by key.
    pub async fn load_tracking_entries(&self) -> Result<TrackingIndex, AppError> {
        let collection = &self.collections.tracking_collection;
        let docs = self.store.get_all(collection).await?;

        let mut index = TrackingIndex {
            total: docs.len(),
            ..Default::default()
        };

        for doc in &docs {
            match ProgressTrackingEntry::from_document(doc) {
                Some(entry) => index.groups.entry(entry.key.to_string()).or_default().push(entry),
                None => index.skipped += 1,
            }
        }

        tracing::info!(
            collection = %collection,
            total = index.total,
            pairs = index.groups.len(),
            skipped = index.skipped,
            "Loaded progress tracking rows"
        );
        Ok(index)
    }

    /// Finds the legacy record for one pair.
    ///
    /// When several documents resolve to the same key the last one wins,
    /// as in [`load_legacy_progress`](Self::load_legacy_progress).
    pub async fn find_legacy_progress(
        &self,
        key: &CompositeKey,
    ) -> Result<Option<LegacyUserProgress>, AppError> {
        let docs = self
            .store
            .get_where(
                &self.collections.legacy_progress_collection,
                "courseId",
                &JsonValue::from(key.course_id()),
            )
            .await?;

        Ok(docs
            .iter()
            .rev()
            .filter_map(LegacyUserProgress::from_document)
            .find(|p| &p.key == key))
    }

    /// Finds the tracking rows for one pair.
    pub async fn find_tracking_entries(
        &self,
        key: &CompositeKey,
    ) -> Result<Vec<ProgressTrackingEntry>, AppError> {
        let docs = self
            .store
            .get_where(
                &self.collections.tracking_collection,
                "userId",
                &JsonValue::from(key.user_id()),
            )
            .await?;

        Ok(docs
            .iter()
            .filter_map(ProgressTrackingEntry::from_document)
            .filter(|e| &e.key == key)
            .collect())
    }

    /// Merge-writes a flattened record at its composite key.
    pub async fn save_course_progress(&self, progress: &CourseProgress) -> Result<(), AppError> {
        let fields = progress.to_fields()?;
        self.store
            .upsert_merge(
                &self.collections.destination_collection,
                &progress.key().to_string(),
                &fields,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use super::*;
    use crate::store::backends::memory::MemoryStore;

    fn fields(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert("userProgress", "u1_c1", fields(json!({"courseId": "c1", "timeSpent": 5})))
            .await;
        store
            .insert("userProgress", "u2_c1", fields(json!({"courseId": "c1"})))
            .await;
        store
            .insert("userProgress", "broken", fields(json!({"status": "started"})))
            .await;
        store
            .insert(
                "progress_tracking",
                "t1",
                fields(json!({"userId": "u1", "courseId": "c1", "chapterId": "ch1", "timeSpent": 10})),
            )
            .await;
        store
            .insert(
                "progress_tracking",
                "t2",
                fields(json!({"userId": "u1", "courseId": "c2", "chapterId": "ch9"})),
            )
            .await;
        store
            .insert("progress_tracking", "t3", fields(json!({"userId": "u1"})))
            .await;
        store
    }

    #[tokio::test]
    async fn test_load_legacy_progress_skips_unkeyed() {
        let store = seeded_store().await;
        let config = MigrationConfig::default();
        let repo = ProgressRepository::new(&store, &config);

        let index = repo.load_legacy_progress().await.unwrap();
        assert_eq!(index.total, 3);
        assert_eq!(index.records.len(), 2);
        assert_eq!(index.skipped, 1);
        assert_eq!(index.duplicates, 0);
    }

    #[tokio::test]
    async fn test_load_legacy_progress_counts_duplicates() {
        let store = MemoryStore::new();
        store
            .insert("userProgress", "a", fields(json!({"userId": "u1", "courseId": "c1", "timeSpent": 1})))
            .await;
        store
            .insert("userProgress", "b", fields(json!({"userId": "u1", "courseId": "c1", "timeSpent": 2})))
            .await;
        let config = MigrationConfig::default();
        let repo = ProgressRepository::new(&store, &config);

        let index = repo.load_legacy_progress().await.unwrap();
        assert_eq!(index.records.len(), 1);
        assert_eq!(index.duplicates, 1);
        let kept = index.records.get("u1_c1").unwrap();
        assert_eq!(kept.time_spent, Some(2));
    }

    #[tokio::test]
    async fn test_load_legacy_progress_colliding_keys_count_as_duplicates() {
        let store = MemoryStore::new();
        store
            .insert("userProgress", "d1", fields(json!({"userId": "a_b", "courseId": "c", "timeSpent": 1})))
            .await;
        store
            .insert("userProgress", "d2", fields(json!({"userId": "a", "courseId": "b_c", "timeSpent": 2})))
            .await;
        let config = MigrationConfig::default();
        let repo = ProgressRepository::new(&store, &config);

        let index = repo.load_legacy_progress().await.unwrap();
        assert_eq!(index.records.len(), 1);
        assert_eq!(index.duplicates, 1);
        let kept = index.records.get("a_b_c").unwrap();
        assert_eq!(kept.key, CompositeKey::new("a", "b_c"));
    }

    #[tokio::test]
    async fn test_load_tracking_entries_groups_by_key() {
        let store = seeded_store().await;
        let config = MigrationConfig::default();
        let repo = ProgressRepository::new(&store, &config);

        let index = repo.load_tracking_entries().await.unwrap();
        assert_eq!(index.total, 3);
        assert_eq!(index.skipped, 1);
        assert_eq!(index.entries_for("u1_c1").len(), 1);
        assert_eq!(index.entries_for("u1_c2").len(), 1);
        assert!(index.entries_for("u2_c1").is_empty());
    }

    #[tokio::test]
    async fn test_find_by_key() {
        let store = seeded_store().await;
        let config = MigrationConfig::default();
        let repo = ProgressRepository::new(&store, &config);
        let key = CompositeKey::new("u1", "c1");

        let legacy = repo.find_legacy_progress(&key).await.unwrap().unwrap();
        assert_eq!(legacy.time_spent, Some(5));

        let entries = repo.find_tracking_entries(&key).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].chapter_id.as_deref(), Some("ch1"));

        let missing = repo
            .find_legacy_progress(&CompositeKey::new("u3", "c1"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
