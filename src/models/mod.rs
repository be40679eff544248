//! Domain models for course progress.

mod progress;

pub use progress::{
    CompositeKey, CourseProgress, LegacyUserProgress, ProgressTrackingEntry, KEY_SEPARATOR,
};
