//! Data access layer over the document store.
//!
//! Repositories turn raw documents into domain models and back.

mod progress;

pub use progress::{LegacyProgressIndex, ProgressRepository, TrackingIndex};
