//! Document store abstraction for backend-agnostic collection access.
//!
//! The migrations only see [`DocumentStore`], a three-method capability:
//!
//! - [`DocumentStore::get_all`] - bulk read of a whole collection
//! - [`DocumentStore::get_where`] - equality-filtered read on a top-level field
//! - [`DocumentStore::upsert_merge`] - create or shallow-merge one document
//!
//! # Usage
//!
//! ```ignore
//! use coursekit_migrate::store::{backends::memory::MemoryStore, DocumentStore};
//!
//! let store = MemoryStore::new();
//! store.upsert_merge("userProgress", "u1_c1", &fields).await?;
//! let docs = store.get_all("userProgress").await?;
//! ```

mod document;
mod traits;

pub mod backends;

pub use document::Document;
pub use traits::DocumentStore;
