//! SQL database access for Gonyx applications.
//!
//! Instances are declared in configuration (`[sql.<name>]`) with a `dialect`
//! discriminant choosing sqlite, mysql or postgres; pattern matching on the
//! [`gonyx_config::SqlInstanceConfig`] enum replaces any runtime type
//! inspection. Each instance becomes a lazily-connecting sqlx pool owned by
//! the [`SqlManager`].

mod manager;
mod wrapper;

pub use manager::SqlManager;
pub use wrapper::SqlWrapper;

// Re-exported so callers can run queries without naming sqlx directly.
pub use sqlx::AnyPool;

use thiserror::Error;

/// Error types for SQL operations
#[derive(Debug, Error)]
pub enum SqlError {
    #[error("Creating sql wrapper '{name}' failed: {source}")]
    CreateWrapper {
        name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("No sql instance named: {0}")]
    UnknownInstance(String),

    #[error("Pinging sql instance '{name}' failed: {source}")]
    Ping {
        name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Migration failed: {0}")]
    Migrate(#[source] sqlx::Error),
}

/// Result type for SQL operations
pub type Result<T> = std::result::Result<T, SqlError>;
