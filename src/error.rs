//! Application error types.

use thiserror::Error;

/// Application-level errors for coursekit-migrate.
#[derive(Error, Debug)]
pub enum AppError {
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Failed to read collection '{collection}': {message}")]
    Read { collection: String, message: String },

    #[error("Failed to write '{key}' to collection '{collection}': {message}")]
    Write {
        collection: String,
        key: String,
        message: String,
    },

    // Domain errors
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Unknown migration: {0}")]
    UnknownMigration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a [`AppError::Read`] from any displayable cause.
    pub fn read(collection: &str, cause: impl std::fmt::Display) -> Self {
        Self::Read {
            collection: collection.to_string(),
            message: cause.to_string(),
        }
    }

    /// Builds a [`AppError::Write`] from any displayable cause.
    pub fn write(collection: &str, key: &str, cause: impl std::fmt::Display) -> Self {
        Self::Write {
            collection: collection.to_string(),
            key: key.to_string(),
            message: cause.to_string(),
        }
    }
}
