//! Business logic for the progress migration.
//!
//! Services hold the rules that are independent of storage, so they can be
//! exercised without a database.

pub mod merge;

pub use merge::{merge_course_progress, total_time_spent, DEFAULT_STATUS};
