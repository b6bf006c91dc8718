//! Ownership of every configured SQL instance.

use std::collections::HashMap;

use gonyx_config::AppConfig;
use tracing::info;

use crate::wrapper::SqlWrapper;
use crate::{Result, SqlError};

pub struct SqlManager {
    instances: HashMap<String, SqlWrapper>,
}

impl SqlManager {
    /// Build one wrapper per `[sql.<name>]` section. Pools connect lazily, so
    /// this never blocks on the databases themselves.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let mut instances = HashMap::new();
        for (name, instance_cfg) in &cfg.sql {
            let wrapper = SqlWrapper::new(name.clone(), instance_cfg.clone())?;
            instances.insert(name.clone(), wrapper);
        }
        Ok(Self { instances })
    }

    pub fn instance(&self, name: &str) -> Result<&SqlWrapper> {
        self.instances
            .get(name)
            .ok_or_else(|| SqlError::UnknownInstance(name.to_string()))
    }

    pub fn instance_names(&self) -> Vec<String> {
        self.instances.keys().cloned().collect()
    }

    pub async fn close_all(&self) {
        for wrapper in self.instances.values() {
            wrapper.close().await;
        }
    }

    /// Apply a new configuration snapshot: all pools are closed and recreated
    /// from the new instance tables.
    pub async fn update_configs(&mut self, cfg: &AppConfig) -> Result<()> {
        self.close_all().await;
        let rebuilt = Self::from_config(cfg)?;
        self.instances = rebuilt.instances;
        info!(instances = self.instances.len(), "sql manager rebuilt");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonyx_config::{PoolConfig, SqlInstanceConfig, SqliteConfig};
    use std::collections::HashMap as StdHashMap;

    fn config_with_instance(name: &str) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.sql.insert(
            name.to_string(),
            SqlInstanceConfig::Sqlite(SqliteConfig {
                file: ":memory:".into(),
                options: StdHashMap::new(),
                pool: PoolConfig::default(),
            }),
        );
        cfg
    }

    #[tokio::test]
    async fn manager_exposes_instances_by_name() {
        let manager = SqlManager::from_config(&config_with_instance("main")).unwrap();
        assert!(manager.instance("main").is_ok());
        assert!(matches!(
            manager.instance("other"),
            Err(SqlError::UnknownInstance(_))
        ));
    }

    #[tokio::test]
    async fn update_rebuilds_instance_set() {
        let mut manager = SqlManager::from_config(&config_with_instance("main")).unwrap();
        manager
            .update_configs(&config_with_instance("analytics"))
            .await
            .unwrap();
        assert!(manager.instance("main").is_err());
        assert!(manager.instance("analytics").is_ok());
    }
}
