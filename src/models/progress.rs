//! Course progress records, legacy and flattened.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::store::Document;

/// Separator between user and course in a composite key.
pub const KEY_SEPARATOR: char = '_';

/// Identifies one (user, course) pair: `"{userId}_{courseId}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    user_id: String,
    course_id: String,
}

impl CompositeKey {
    pub fn new(user_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            course_id: course_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    /// Extracts the user part of a document key by splitting on the first separator.
    ///
    /// Returns `None` when the key has no separator or the user part is empty.
    pub fn user_prefix(document_id: &str) -> Option<&str> {
        document_id
            .split_once(KEY_SEPARATOR)
            .map(|(user, _)| user)
            .filter(|user| !user.is_empty())
    }
}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.user_id, KEY_SEPARATOR, self.course_id)
    }
}

/// One legacy per-course progress record.
///
/// Every field besides the key is optional in the source data.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyUserProgress {
    pub key: CompositeKey,
    pub completed_chapters: Option<Vec<String>>,
    pub completed_content_blocks: Option<Vec<String>>,
    pub content_blocks_time_spent: Option<BTreeMap<String, u64>>,
    pub time_spent: Option<u64>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub current_chapter: Option<String>,
    pub current_section: Option<String>,
    pub last_content_block_id: Option<String>,
}

impl LegacyUserProgress {
    /// A record carrying only its key.
    pub fn new(key: CompositeKey) -> Self {
        Self {
            key,
            completed_chapters: None,
            completed_content_blocks: None,
            content_blocks_time_spent: None,
            time_spent: None,
            last_accessed_at: None,
            status: None,
            current_chapter: None,
            current_section: None,
            last_content_block_id: None,
        }
    }

    /// Decodes a legacy progress document.
    ///
    /// `courseId` must be a field. `userId` comes from the field when present,
    /// otherwise from the document key. Returns `None` if either is missing.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let course_id = non_empty(lenient::<String>(doc, "courseId"))?;
        let user_id = non_empty(lenient::<String>(doc, "userId"))
            .or_else(|| CompositeKey::user_prefix(&doc.id).map(str::to_string))?;

        Some(Self {
            key: CompositeKey::new(user_id, course_id),
            completed_chapters: lenient(doc, "completedChapters"),
            completed_content_blocks: lenient(doc, "completedContentBlocks"),
            content_blocks_time_spent: block_times(doc, "contentBlocksTimeSpent"),
            time_spent: seconds(doc, "timeSpent"),
            last_accessed_at: timestamp(doc, "lastAccessedAt"),
            status: lenient(doc, "status"),
            current_chapter: lenient(doc, "currentChapter"),
            current_section: lenient(doc, "currentSection"),
            last_content_block_id: lenient(doc, "lastContentBlockId"),
        })
    }
}

/// One legacy per-chapter tracking row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTrackingEntry {
    pub key: CompositeKey,
    pub chapter_id: Option<String>,
    pub section_id: Option<String>,
    pub time_spent: u64,
}

impl ProgressTrackingEntry {
    /// Decodes a tracking row. Returns `None` if `userId` or `courseId` is missing.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let user_id = non_empty(lenient::<String>(doc, "userId"))?;
        let course_id = non_empty(lenient::<String>(doc, "courseId"))?;

        Some(Self {
            key: CompositeKey::new(user_id, course_id),
            chapter_id: non_empty(lenient(doc, "chapterId")),
            section_id: non_empty(lenient(doc, "sectionId")),
            time_spent: seconds(doc, "timeSpent").unwrap_or(0),
        })
    }
}

/// Flattened progress record written to the destination collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub user_id: String,
    pub course_id: String,
    pub completed_chapters: Vec<String>,
    pub completed_sections: Vec<String>,
    pub completed_content_blocks: Vec<String>,
    pub completed_quizzes: Vec<String>,
    pub content_blocks_time_spent: BTreeMap<String, u64>,
    pub time_spent: u64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub status: String,
    pub current_chapter: Option<String>,
    pub current_section: Option<String>,
    pub last_content_block_id: Option<String>,
}

impl CourseProgress {
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(self.user_id.clone(), self.course_id.clone())
    }

    /// Serializes the record into the top-level field map used for merge-writes.
    pub fn to_fields(&self) -> Result<Map<String, JsonValue>, AppError> {
        match serde_json::to_value(self)? {
            JsonValue::Object(map) => Ok(map),
            other => Err(AppError::Internal(format!(
                "course progress serialized to non-object: {}",
                other
            ))),
        }
    }
}

/// Decodes an optional field, treating a malformed value as absent.
fn lenient<T: DeserializeOwned>(doc: &Document, field: &str) -> Option<T> {
    doc.get_opt(field).unwrap_or_else(|e| {
        tracing::warn!(document = %doc.id, field, error = %e, "Ignoring malformed field");
        None
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Elapsed seconds; integers are kept, non-negative floats are rounded.
fn seconds_from(value: &JsonValue) -> Option<u64> {
    let JsonValue::Number(number) = value else {
        return None;
    };
    number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f.round() as u64)
    })
}

fn seconds(doc: &Document, field: &str) -> Option<u64> {
    let value = doc.get_raw(field).filter(|v| !v.is_null())?;
    let parsed = seconds_from(value);
    if parsed.is_none() {
        tracing::warn!(document = %doc.id, field, value = %value, "Ignoring malformed duration");
    }
    parsed
}

fn block_times(doc: &Document, field: &str) -> Option<BTreeMap<String, u64>> {
    let raw: Map<String, JsonValue> = lenient(doc, field)?;
    Some(
        raw.into_iter()
            .filter_map(|(block, value)| match seconds_from(&value) {
                Some(secs) => Some((block, secs)),
                None => {
                    tracing::warn!(document = %doc.id, field, block = %block, "Ignoring malformed block duration");
                    None
                }
            })
            .collect(),
    )
}

/// Accepts RFC 3339 strings, `{seconds, nanoseconds}` objects (with or
/// without leading underscores), and epoch milliseconds.
fn timestamp(doc: &Document, field: &str) -> Option<DateTime<Utc>> {
    let value = doc.get_raw(field).filter(|v| !v.is_null())?;
    let parsed = match value {
        JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        JsonValue::Object(obj) => {
            let secs = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(JsonValue::as_i64);
            let nanos = obj
                .get("nanoseconds")
                .or_else(|| obj.get("_nanoseconds"))
                .and_then(JsonValue::as_u64)
                .unwrap_or(0);
            secs.and_then(|s| Utc.timestamp_opt(s, u32::try_from(nanos).ok()?).single())
        }
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    };

    if parsed.is_none() {
        tracing::warn!(document = %doc.id, field, value = %value, "Ignoring malformed timestamp");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: JsonValue) -> Document {
        match value {
            JsonValue::Object(map) => Document::new(id, map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_composite_key_display() {
        assert_eq!(CompositeKey::new("u1", "c1").to_string(), "u1_c1");
    }

    #[test]
    fn test_user_prefix_splits_on_first_separator() {
        assert_eq!(CompositeKey::user_prefix("u1_course_2"), Some("u1"));
        assert_eq!(CompositeKey::user_prefix("nounderscore"), None);
        assert_eq!(CompositeKey::user_prefix("_c1"), None);
    }

    #[test]
    fn test_legacy_user_id_from_document_key() {
        let progress = LegacyUserProgress::from_document(&doc("u1_c1", json!({"courseId": "c1"})))
            .expect("should decode");
        assert_eq!(progress.key, CompositeKey::new("u1", "c1"));
    }

    #[test]
    fn test_legacy_explicit_user_id_wins() {
        let progress = LegacyUserProgress::from_document(&doc(
            "legacy-key_c1",
            json!({"userId": "u9", "courseId": "c1"}),
        ))
        .expect("should decode");
        assert_eq!(progress.key, CompositeKey::new("u9", "c1"));
    }

    #[test]
    fn test_legacy_without_course_is_skipped() {
        assert!(LegacyUserProgress::from_document(&doc("u1_c1", json!({"userId": "u1"}))).is_none());
    }

    #[test]
    fn test_legacy_without_derivable_user_is_skipped() {
        assert!(LegacyUserProgress::from_document(&doc("orphan", json!({"courseId": "c1"}))).is_none());
    }

    #[test]
    fn test_legacy_full_record() {
        let progress = LegacyUserProgress::from_document(&doc(
            "u1_c1",
            json!({
                "courseId": "c1",
                "completedChapters": ["ch1", "ch2"],
                "completedContentBlocks": ["b1"],
                "contentBlocksTimeSpent": {"b1": 30, "b2": 12.6},
                "timeSpent": 42,
                "lastAccessedAt": "2024-03-01T10:00:00Z",
                "status": "completed",
                "currentChapter": "ch2",
                "currentSection": "s3",
                "lastContentBlockId": "b1"
            }),
        ))
        .expect("should decode");

        assert_eq!(progress.completed_chapters, Some(vec!["ch1".into(), "ch2".into()]));
        assert_eq!(progress.completed_content_blocks, Some(vec!["b1".into()]));
        let times = progress.content_blocks_time_spent.unwrap();
        assert_eq!(times.get("b1"), Some(&30));
        assert_eq!(times.get("b2"), Some(&13));
        assert_eq!(progress.time_spent, Some(42));
        assert_eq!(
            progress.last_accessed_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(progress.status.as_deref(), Some("completed"));
        assert_eq!(progress.current_chapter.as_deref(), Some("ch2"));
        assert_eq!(progress.current_section.as_deref(), Some("s3"));
        assert_eq!(progress.last_content_block_id.as_deref(), Some("b1"));
    }

    #[test]
    fn test_legacy_malformed_fields_treated_as_absent() {
        let progress = LegacyUserProgress::from_document(&doc(
            "u1_c1",
            json!({
                "courseId": "c1",
                "completedChapters": "ch1",
                "timeSpent": -5,
                "lastAccessedAt": "yesterday"
            }),
        ))
        .expect("should decode");

        assert_eq!(progress.completed_chapters, None);
        assert_eq!(progress.time_spent, None);
        assert_eq!(progress.last_accessed_at, None);
    }

    #[test]
    fn test_firestore_style_timestamp() {
        let progress = LegacyUserProgress::from_document(&doc(
            "u1_c1",
            json!({"courseId": "c1", "lastAccessedAt": {"_seconds": 1700000000, "_nanoseconds": 0}}),
        ))
        .unwrap();
        assert_eq!(
            progress.last_accessed_at,
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
    }

    #[test]
    fn test_tracking_entry_requires_both_ids() {
        assert!(ProgressTrackingEntry::from_document(&doc("t1", json!({"userId": "u1"}))).is_none());
        assert!(ProgressTrackingEntry::from_document(&doc("t2", json!({"courseId": "c1"}))).is_none());
    }

    #[test]
    fn test_tracking_entry_defaults_time_to_zero() {
        let entry = ProgressTrackingEntry::from_document(&doc(
            "t1",
            json!({"userId": "u1", "courseId": "c1", "chapterId": "ch1"}),
        ))
        .unwrap();
        assert_eq!(entry.key, CompositeKey::new("u1", "c1"));
        assert_eq!(entry.chapter_id.as_deref(), Some("ch1"));
        assert_eq!(entry.section_id, None);
        assert_eq!(entry.time_spent, 0);
    }

    #[test]
    fn test_course_progress_fields_are_camel_case() {
        let progress = CourseProgress {
            user_id: "u1".into(),
            course_id: "c1".into(),
            completed_chapters: vec![],
            completed_sections: vec![],
            completed_content_blocks: vec![],
            completed_quizzes: vec![],
            content_blocks_time_spent: BTreeMap::new(),
            time_spent: 0,
            last_accessed_at: None,
            status: "in_progress".into(),
            current_chapter: None,
            current_section: None,
            last_content_block_id: None,
        };

        let fields = progress.to_fields().unwrap();
        assert_eq!(fields.get("userId"), Some(&json!("u1")));
        assert_eq!(fields.get("completedQuizzes"), Some(&json!([])));
        assert_eq!(fields.get("lastAccessedAt"), Some(&JsonValue::Null));
        assert_eq!(progress.key().to_string(), "u1_c1");
    }
}
