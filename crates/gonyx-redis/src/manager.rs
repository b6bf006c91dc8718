//! Ownership of every configured Redis client.

use std::collections::HashMap;

use gonyx_config::AppConfig;
use tracing::info;

use crate::client::RedisClient;
use crate::{RedisError, Result};

pub struct RedisManager {
    clients: HashMap<String, RedisClient>,
}

impl RedisManager {
    /// Build one client per `[redis.<name>]` section. Pools are created
    /// without connecting; reachability is a [`RedisClient::ping`] concern.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let mut clients = HashMap::new();
        for (name, instance_cfg) in &cfg.redis {
            let client = RedisClient::new(name.clone(), instance_cfg, &cfg.app.name)?;
            clients.insert(name.clone(), client);
        }
        Ok(Self { clients })
    }

    pub fn client(&self, name: &str) -> Result<&RedisClient> {
        self.clients
            .get(name)
            .ok_or_else(|| RedisError::UnknownClient(name.to_string()))
    }

    pub fn client_names(&self) -> Vec<String> {
        self.clients.keys().cloned().collect()
    }

    pub fn close_all(&self) {
        for client in self.clients.values() {
            client.close();
        }
    }

    /// Apply a new configuration snapshot: close every pool and rebuild the
    /// client set from the new instance tables.
    pub fn update_configs(&mut self, cfg: &AppConfig) -> Result<()> {
        self.close_all();
        let rebuilt = Self::from_config(cfg)?;
        self.clients = rebuilt.clients;
        info!(clients = self.clients.len(), "redis manager rebuilt");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonyx_config::RedisInstanceConfig;

    fn config_with_client(name: &str) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.redis
            .insert(name.to_string(), RedisInstanceConfig::default());
        cfg
    }

    #[test]
    fn manager_exposes_clients_by_name() {
        let manager = RedisManager::from_config(&config_with_client("cache")).unwrap();
        assert!(manager.client("cache").is_ok());
        assert!(matches!(
            manager.client("sessions"),
            Err(RedisError::UnknownClient(_))
        ));
    }

    #[test]
    fn update_rebuilds_client_set() {
        let mut manager = RedisManager::from_config(&config_with_client("cache")).unwrap();
        manager
            .update_configs(&config_with_client("sessions"))
            .unwrap();
        assert!(manager.client("cache").is_err());
        assert!(manager.client("sessions").is_ok());
    }
}
