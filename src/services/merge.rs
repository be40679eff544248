//! Merges legacy progress with its tracking rows into one flattened record.
//!
//! The merge is pure: the same inputs always produce the same record, which
//! is what makes re-running the migration over an unchanged source safe.
//!
//! Field precedence:
//!
//! | Field | Precedence |
//! |-------|------------|
//! | `completedChapters` | legacy list, then tracking chapters; deduplicated |
//! | `completedSections` | tracking sections; deduplicated |
//! | `completedContentBlocks` | legacy list, else empty |
//! | `completedQuizzes` | always empty |
//! | `contentBlocksTimeSpent` | legacy map, else empty |
//! | `timeSpent` | nonzero tracking sum, else legacy, else 0 |
//! | `lastAccessedAt` | legacy, else null |
//! | `status` | legacy, else [`DEFAULT_STATUS`] |
//! | navigation cursors | legacy, else null |

use std::collections::HashSet;

use crate::models::{CourseProgress, LegacyUserProgress, ProgressTrackingEntry};

/// Status given to records whose legacy progress carries none.
pub const DEFAULT_STATUS: &str = "in_progress";

/// Builds the flattened record for one (user, course) pair.
///
/// `entries` are the tracking rows sharing the legacy record's key; an empty
/// slice is valid.
pub fn merge_course_progress(
    legacy: &LegacyUserProgress,
    entries: &[ProgressTrackingEntry],
) -> CourseProgress {
    let completed_chapters = dedup(
        legacy
            .completed_chapters
            .iter()
            .flatten()
            .map(String::as_str)
            .chain(entries.iter().filter_map(|e| e.chapter_id.as_deref())),
    );
    let completed_sections = dedup(entries.iter().filter_map(|e| e.section_id.as_deref()));

    CourseProgress {
        user_id: legacy.key.user_id().to_string(),
        course_id: legacy.key.course_id().to_string(),
        completed_chapters,
        completed_sections,
        completed_content_blocks: legacy.completed_content_blocks.clone().unwrap_or_default(),
        completed_quizzes: Vec::new(),
        content_blocks_time_spent: legacy.content_blocks_time_spent.clone().unwrap_or_default(),
        time_spent: total_time_spent(legacy, entries),
        last_accessed_at: legacy.last_accessed_at,
        status: legacy
            .status
            .clone()
            .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        current_chapter: legacy.current_chapter.clone(),
        current_section: legacy.current_section.clone(),
        last_content_block_id: legacy.last_content_block_id.clone(),
    }
}

/// Sum of tracked time when there is any, otherwise the legacy total, otherwise 0.
pub fn total_time_spent(legacy: &LegacyUserProgress, entries: &[ProgressTrackingEntry]) -> u64 {
    let tracked = entries
        .iter()
        .fold(0u64, |sum, e| sum.saturating_add(e.time_spent));

    if tracked != 0 {
        tracked
    } else {
        legacy.time_spent.unwrap_or(0)
    }
}

/// Keeps the first occurrence of each id, in input order.
fn dedup<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}
