//! Backend implementations of [`DocumentStore`](crate::store::DocumentStore).
//!
//! # Available Backends
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | PostgreSQL (JSONB) | [`postgres`] | Production |
//! | In-memory | [`memory`] | Tests and local experiments |
//!
//! # Implementing a Backend
//!
//! 1. Create a store struct (e.g., `PostgresStore`)
//! 2. Implement `DocumentStore` for it
//! 3. Return documents in ascending key order from reads so runs are
//!    reproducible

pub mod memory;
pub mod postgres;
