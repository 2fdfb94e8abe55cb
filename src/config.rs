//! Runtime configuration.
//!
//! Settings come from a TOML document, from `SWIMLANE_*` environment
//! variables, or both: environment values override the document.

use crate::kanban::adapters::{notifier::BroadcastNotifier, postgres::KanbanPgPool};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the `PostgreSQL` connection URL.
pub const DATABASE_URL_ENV: &str = "SWIMLANE_DATABASE_URL";
/// Environment variable holding the maximum pool size.
pub const POOL_MAX_SIZE_ENV: &str = "SWIMLANE_POOL_MAX_SIZE";
/// Environment variable holding the per-subscriber notification buffer.
pub const NOTIFIER_CAPACITY_ENV: &str = "SWIMLANE_NOTIFIER_CAPACITY";

const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_NOTIFIER_CAPACITY: usize = 256;

/// Kanban core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanbanConfig {
    /// `PostgreSQL` connection URL; `None` when only in-memory storage is used.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,

    /// Notifications buffered per subscriber before it starts lagging.
    #[serde(default = "default_notifier_capacity")]
    pub notifier_capacity: usize,
}

impl Default for KanbanConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            pool_max_size: default_pool_max_size(),
            notifier_capacity: default_notifier_capacity(),
        }
    }
}

const fn default_pool_max_size() -> u32 {
    DEFAULT_POOL_MAX_SIZE
}

const fn default_notifier_capacity() -> usize {
    DEFAULT_NOTIFIER_CAPACITY
}

/// Errors raised while loading configuration or building resources from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document is malformed.
    #[error("invalid configuration document: {0}")]
    Document(#[from] toml::de::Error),

    /// A numeric setting could not be parsed.
    #[error("invalid value '{value}' for {key}")]
    InvalidNumber {
        /// Setting name.
        key: &'static str,
        /// Rejected value.
        value: String,
    },

    /// A setting is out of range.
    #[error("{key} must be greater than zero")]
    Zero {
        /// Setting name.
        key: &'static str,
    },

    /// A database pool was requested without a database URL.
    #[error("no database URL configured; set {DATABASE_URL_ENV}")]
    MissingDatabaseUrl,

    /// The connection pool could not be built.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl KanbanConfig {
    /// Loads configuration from the process environment over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Parses a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document is malformed or a value is
    /// out of range.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()
    }

    /// Applies overrides read through `lookup`, keyed by environment
    /// variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an override holds an invalid value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|value| !value.trim().is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(raw) = lookup(POOL_MAX_SIZE_ENV) {
            self.pool_max_size = parse_number(POOL_MAX_SIZE_ENV, &raw)?;
        }
        if let Some(raw) = lookup(NOTIFIER_CAPACITY_ENV) {
            self.notifier_capacity = parse_number(NOTIFIER_CAPACITY_ENV, &raw)?;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.pool_max_size == 0 {
            return Err(ConfigError::Zero {
                key: "pool_max_size",
            });
        }
        if self.notifier_capacity == 0 {
            return Err(ConfigError::Zero {
                key: "notifier_capacity",
            });
        }
        Ok(self)
    }

    /// Builds the `PostgreSQL` connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] without a URL or
    /// [`ConfigError::Pool`] when the pool cannot connect.
    pub fn build_pool(&self) -> Result<KanbanPgPool, ConfigError> {
        let url = self
            .database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)?;
        let manager = ConnectionManager::<PgConnection>::new(url);
        let pool = Pool::builder()
            .max_size(self.pool_max_size)
            .build(manager)?;
        Ok(pool)
    }

    /// Builds the board notifier.
    #[must_use]
    pub fn build_notifier(&self) -> BroadcastNotifier {
        BroadcastNotifier::new(self.notifier_capacity)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.to_owned(),
    })
}
