//! Configuration management for Gonyx applications.
//!
//! One typed schema ([`AppConfig`]) covers every framework section: the HTTP
//! servers, SQL instances, Redis instances and logging. Configuration is read
//! once at startup from a TOML file plus `GONYX__`-prefixed environment
//! overrides, validated as a whole, and then shared as an immutable snapshot
//! behind [`SharedConfig`]. A file watcher can replace the snapshot at runtime
//! and broadcast a change event; consumers rebuild from the new snapshot
//! rather than mutating live state.

pub mod events;
pub mod loader;
pub mod schema;
pub mod watch;

pub use events::{ChangeSource, ConfigChangeEvent};
pub use loader::load_config;
pub use schema::{
    AppConfig, AppSettings, CorsConfig, FaviconConfig, HttpServerConfig, LoggingConfig,
    MiddlewareConfig, PoolConfig, RedisInstanceConfig, SqlInstanceConfig, SqliteConfig,
};
pub use watch::{ConfigWatcher, SharedConfig, new_shared};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Build error: {0}")]
    Build(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Watcher error: {0}")]
    Watcher(String),
}

impl ConfigError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn watcher(msg: impl Into<String>) -> Self {
        Self::Watcher(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
