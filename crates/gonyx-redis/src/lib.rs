//! Redis access for Gonyx applications.
//!
//! Each `[redis.<name>]` section becomes a pooled [`RedisClient`] owned by
//! the [`RedisManager`]. Clients optionally prefix every key with the
//! application name so multiple services can share one Redis without
//! colliding.

mod client;
mod manager;

pub use client::RedisClient;
pub use manager::RedisManager;

use thiserror::Error;

/// Error types for Redis operations
#[derive(Debug, Error)]
pub enum RedisError {
    #[error("Creating redis client '{name}' failed: {reason}")]
    CreateClient { name: String, reason: String },

    #[error("No redis client named: {0}")]
    UnknownClient(String),

    #[error("Checking out a redis connection failed: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Reading '{key}' failed: {source}")]
    Read {
        key: String,
        #[source]
        source: redis::RedisError,
    },

    #[error("Writing '{key}' failed: {source}")]
    Write {
        key: String,
        #[source]
        source: redis::RedisError,
    },

    #[error("Ping failed: {0}")]
    Ping(#[source] redis::RedisError),

    #[error("JSON round-trip for '{key}' failed: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for Redis operations
pub type Result<T> = std::result::Result<T, RedisError>;
