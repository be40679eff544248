//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/coursekit-migrate/config.toml` (XDG) or platform config dir
//! 2. Project config: `.coursekit-migrate.toml`
//! 3. Environment variables: `COURSEKIT_*`
//!
//! # Example
//!
//! ```toml
//! [database]
//! project_id = "acme-lms"
//! endpoint = "postgresql://lms@localhost:5432/lms"
//! credentials = "secret"
//!
//! [migration]
//! write_concurrency = 4
//! ```
//!
//! Environment variables use `_` as the nesting separator, so
//! `COURSEKIT_DATABASE_ENDPOINT` sets `database.endpoint`. Keys that contain
//! underscores themselves (`project_id`, `write_concurrency`) are set through
//! the TOML files.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Document database connection settings.
///
/// Injected into the store constructor at startup; nothing here is ever
/// held in a global.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Tenant namespace inside the document store.
    pub project_id: String,
    /// PostgreSQL connection string, e.g. `postgresql://user@host:5432/lms`.
    pub endpoint: String,
    /// Password; overrides any password embedded in `endpoint`.
    #[serde(default)]
    pub credentials: Option<String>,
    /// Maximum pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("project_id", &self.project_id)
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials.as_ref().map(|_| "<redacted>"))
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

/// Collection names and write behaviour for the progress migration.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    #[serde(default = "default_legacy_progress_collection")]
    pub legacy_progress_collection: String,
    #[serde(default = "default_tracking_collection")]
    pub tracking_collection: String,
    #[serde(default = "default_destination_collection")]
    pub destination_collection: String,
    /// Number of in-flight writes. `1` writes strictly one after another.
    #[serde(default = "default_write_concurrency")]
    pub write_concurrency: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            legacy_progress_collection: default_legacy_progress_collection(),
            tracking_collection: default_tracking_collection(),
            destination_collection: default_destination_collection(),
            write_concurrency: default_write_concurrency(),
        }
    }
}

fn default_pool_size() -> usize {
    8
}

fn default_legacy_progress_collection() -> String {
    "userProgress".to_string()
}

fn default_tracking_collection() -> String {
    "progress_tracking".to_string()
}

fn default_destination_collection() -> String {
    "userCourseProgress".to_string()
}

fn default_write_concurrency() -> usize {
    1
}

/// Project config file name, resolved against the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".coursekit-migrate.toml";

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::user_config_path(), Path::new(PROJECT_CONFIG_FILE))
    }

    /// Load config from explicit file locations, still honouring env overrides.
    pub fn load_from(user_config: &Path, project_config: &Path) -> Result<Self, ConfigError> {
        let config: Config = Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(user_config))
            // Layer 2: Project config
            .merge(Toml::file(project_config))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("COURSEKIT_").split("_"))
            .extract()?;

        if config.migration.write_concurrency == 0 {
            return Err(figment::Error::from(
                "migration.write_concurrency must be at least 1".to_string(),
            )
            .into());
        }

        Ok(config)
    }

    /// User config path: ~/.config/coursekit-migrate/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home
                .join(".config")
                .join("coursekit-migrate")
                .join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("coursekit-migrate").join("config.toml"))
            .unwrap_or_default()
    }
}
