//! A single pooled Redis client.

use std::time::Duration;

use deadpool_redis::{Config as PoolSource, Pool, Runtime};
use redis::AsyncCommands;
use serde::Serialize;
use serde::de::DeserializeOwned;

use gonyx_config::RedisInstanceConfig;

use crate::{RedisError, Result};

/// Pooled client for one configured Redis instance.
///
/// Connections are checked out per operation; the pool itself is created
/// without touching the network, so a dead Redis surfaces on first use (or
/// via [`ping`](Self::ping)).
pub struct RedisClient {
    name: String,
    prefix: String,
    pool: Pool,
}

impl RedisClient {
    /// `app_name` becomes the key prefix when `add_app_prefix` is set.
    pub fn new(name: impl Into<String>, cfg: &RedisInstanceConfig, app_name: &str) -> Result<Self> {
        let name = name.into();
        let prefix = if cfg.add_app_prefix {
            app_name.to_string()
        } else {
            String::new()
        };

        let mut source = PoolSource::from_url(&cfg.url);
        let pool_cfg = source.pool.get_or_insert_with(Default::default);
        pool_cfg.max_size = cfg.pool_size;
        pool_cfg.timeouts.wait = Some(Duration::from_millis(cfg.connect_timeout_ms));
        pool_cfg.timeouts.create = Some(Duration::from_millis(cfg.connect_timeout_ms));

        let pool = source
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| RedisError::CreateClient {
                name: name.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(client = %name, prefixed = !prefix.is_empty(), "redis client created");
        Ok(Self { name, prefix, pool })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key as written to Redis: `{prefix}$key` when a prefix is set.
    pub fn generate_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}${}", self.prefix, key)
        }
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.get().await?;
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(RedisError::Ping)
    }

    pub async fn get<T: redis::FromRedisValue>(&self, key: &str) -> Result<T> {
        let mut conn = self.pool.get().await?;
        conn.get(self.generate_key(key))
            .await
            .map_err(|source| RedisError::Read {
                key: key.to_string(),
                source,
            })
    }

    pub async fn set<V>(&self, key: &str, value: V, expiration: Option<Duration>) -> Result<()>
    where
        V: redis::ToRedisArgs + Send + Sync,
    {
        let mut conn = self.pool.get().await?;
        let full_key = self.generate_key(key);
        let write = |source| RedisError::Write {
            key: key.to_string(),
            source,
        };
        match expiration {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(full_key, value, ttl.as_secs())
                .await
                .map_err(write),
            None => conn.set::<_, _, ()>(full_key, value).await.map_err(write),
        }
    }

    /// Serialize a struct to JSON and store it.
    pub async fn set_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        expiration: Option<Duration>,
    ) -> Result<()> {
        let payload = serde_json::to_vec(value).map_err(|source| RedisError::Json {
            key: key.to_string(),
            source,
        })?;
        self.set(key, payload, expiration).await
    }

    /// Fetch and deserialize a JSON-encoded struct.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let raw: Vec<u8> = self.get(key).await?;
        serde_json::from_slice(&raw).map_err(|source| RedisError::Json {
            key: key.to_string(),
            source,
        })
    }

    /// Set hash fields, optionally bounding the whole hash with a TTL.
    pub async fn hset<F, V>(
        &self,
        key: &str,
        items: &[(F, V)],
        expiration: Option<Duration>,
    ) -> Result<()>
    where
        F: redis::ToRedisArgs + Send + Sync,
        V: redis::ToRedisArgs + Send + Sync,
    {
        let mut conn = self.pool.get().await?;
        let full_key = self.generate_key(key);
        conn.hset_multiple::<_, _, _, ()>(&full_key, items)
            .await
            .map_err(|source| RedisError::Write {
                key: key.to_string(),
                source,
            })?;
        if let Some(ttl) = expiration {
            conn.expire::<_, ()>(&full_key, ttl.as_secs() as i64)
                .await
                .map_err(|source| RedisError::Write {
                    key: key.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn hget<T: redis::FromRedisValue>(&self, key: &str, field: &str) -> Result<T> {
        let mut conn = self.pool.get().await?;
        conn.hget(self.generate_key(key), field)
            .await
            .map_err(|source| RedisError::Read {
                key: format!("{key}:{field}"),
                source,
            })
    }

    pub async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(self.generate_key(key))
            .await
            .map_err(|source| RedisError::Write {
                key: key.to_string(),
                source,
            })
    }

    /// Close the pool; subsequent operations fail with a pool error.
    pub fn close(&self) {
        self.pool.close();
        tracing::debug!(client = %self.name, "redis pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(add_prefix: bool) -> RedisInstanceConfig {
        RedisInstanceConfig {
            add_app_prefix: add_prefix,
            ..Default::default()
        }
    }

    #[test]
    fn keys_are_prefixed_with_app_name() {
        let client = RedisClient::new("cache", &instance(true), "shop").unwrap();
        assert_eq!(client.generate_key("session:1"), "shop$session:1");
    }

    #[test]
    fn keys_pass_through_without_prefix() {
        let client = RedisClient::new("cache", &instance(false), "shop").unwrap();
        assert_eq!(client.generate_key("session:1"), "session:1");
    }

    #[test]
    fn bad_url_is_a_create_error() {
        let cfg = RedisInstanceConfig {
            url: "not a url".into(),
            ..Default::default()
        };
        // Pool creation is lazy; an unparseable URL still fails here.
        let err = RedisClient::new("cache", &cfg, "shop");
        assert!(err.is_err());
    }
}
