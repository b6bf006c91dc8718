//! A single configured database instance.

use std::sync::Once;
use std::time::Duration;

use sqlx::Connection;
use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::AnyPool;

use gonyx_config::SqlInstanceConfig;

use crate::{Result, SqlError};

static DRIVERS: Once = Once::new();

/// Wraps one sqlx pool built from an `[sql.<name>]` section.
///
/// The pool connects lazily: constructing the wrapper never touches the
/// network, so a misconfigured instance surfaces on first use (or via
/// [`ping`](Self::ping)), not at startup.
pub struct SqlWrapper {
    name: String,
    config: SqlInstanceConfig,
    pool: AnyPool,
}

impl SqlWrapper {
    pub fn new(name: impl Into<String>, config: SqlInstanceConfig) -> Result<Self> {
        DRIVERS.call_once(install_default_drivers);

        let name = name.into();
        let pool_cfg = config.pool();
        let options = AnyPoolOptions::new()
            .max_connections(pool_cfg.max_connections)
            .min_connections(pool_cfg.min_connections)
            .acquire_timeout(Duration::from_millis(pool_cfg.acquire_timeout_ms))
            .idle_timeout(pool_cfg.idle_timeout_ms.map(Duration::from_millis))
            .max_lifetime(pool_cfg.max_lifetime_ms.map(Duration::from_millis));

        let url = config.connection_url();
        let pool = options
            .connect_lazy(&url)
            .map_err(|source| SqlError::CreateWrapper {
                name: name.clone(),
                source,
            })?;

        tracing::debug!(instance = %name, dialect = %config.dialect(), "sql pool created");
        Ok(Self { name, config, pool })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> &'static str {
        self.config.dialect()
    }

    /// The underlying pool, for running queries.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Round-trip to the database to verify the instance is reachable.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|source| SqlError::Ping {
                name: self.name.clone(),
                source,
            })?;
        conn.ping().await.map_err(|source| SqlError::Ping {
            name: self.name.clone(),
            source,
        })
    }

    /// Run a caller-supplied migration routine against this instance's pool.
    pub async fn run_migrations<F, Fut>(&self, f: F) -> Result<()>
    where
        F: FnOnce(AnyPool) -> Fut,
        Fut: Future<Output = std::result::Result<(), sqlx::Error>>,
    {
        f(self.pool.clone()).await.map_err(SqlError::Migrate)
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!(instance = %self.name, "sql pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonyx_config::{PoolConfig, SqliteConfig};
    use std::collections::HashMap;

    fn memory_instance() -> SqlInstanceConfig {
        SqlInstanceConfig::Sqlite(SqliteConfig {
            file: ":memory:".into(),
            options: HashMap::new(),
            pool: PoolConfig {
                // A single connection keeps the in-memory database alive and
                // visible across sequential checkouts.
                max_connections: 1,
                ..Default::default()
            },
        })
    }

    #[tokio::test]
    async fn sqlite_memory_round_trip() {
        let wrapper = SqlWrapper::new("main", memory_instance()).unwrap();
        assert_eq!(wrapper.dialect(), "sqlite");
        wrapper.ping().await.unwrap();

        sqlx::query("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT)")
            .execute(wrapper.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO kv (k, v) VALUES ('answer', '42')")
            .execute(wrapper.pool())
            .await
            .unwrap();

        let row: (String,) = sqlx::query_as("SELECT v FROM kv WHERE k = 'answer'")
            .fetch_one(wrapper.pool())
            .await
            .unwrap();
        assert_eq!(row.0, "42");

        wrapper.close().await;
    }

    #[tokio::test]
    async fn migrations_run_through_the_pool() {
        let wrapper = SqlWrapper::new("main", memory_instance()).unwrap();
        wrapper
            .run_migrations(|pool| async move {
                sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY)")
                    .execute(&pool)
                    .await?;
                Ok(())
            })
            .await
            .unwrap();

        sqlx::query("INSERT INTO users (id) VALUES (1)")
            .execute(wrapper.pool())
            .await
            .unwrap();
    }
}
