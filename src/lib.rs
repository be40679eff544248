//! coursekit-migrate - Course progress data migrations
//!
//! Moves learner progress from the legacy nested schema (`userProgress` plus
//! `progress_tracking`) into the flattened `userCourseProgress` collection.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod migrations;
pub mod models;
pub mod repositories;
pub mod services;
pub mod store;
