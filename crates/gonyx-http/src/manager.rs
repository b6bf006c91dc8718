//! Ownership of every configured HTTP server.
//!
//! The manager is an explicit service object: built once from the loaded
//! configuration and passed by reference to whoever needs to declare routes
//! or drive the lifecycle. On a configuration change it rebuilds each server
//! from its retained declarations instead of patching live state.

use std::collections::HashMap;

use gonyx_config::AppConfig;
use tracing::info;

use crate::error::{HttpError, Result};
use crate::server::HttpServer;

pub struct HttpManager {
    servers: HashMap<String, HttpServer>,
}

impl HttpManager {
    /// Build one server per `[[http.servers]]` entry. Servers are created
    /// stopped; call [`start_all`](Self::start_all) (or start individually)
    /// after routes are declared.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let mut servers = HashMap::new();
        for server_cfg in &cfg.http.servers {
            let server = HttpServer::new(server_cfg.name.clone(), server_cfg.clone())?;
            servers.insert(server_cfg.name.clone(), server);
        }
        Ok(Self { servers })
    }

    pub fn server(&self, name: &str) -> Result<&HttpServer> {
        self.servers
            .get(name)
            .ok_or_else(|| HttpError::UnknownServer(name.to_string()))
    }

    pub fn server_mut(&mut self, name: &str) -> Result<&mut HttpServer> {
        self.servers
            .get_mut(name)
            .ok_or_else(|| HttpError::UnknownServer(name.to_string()))
    }

    pub fn server_names(&self) -> Vec<String> {
        self.servers.keys().cloned().collect()
    }

    pub async fn start_all(&mut self) -> Result<()> {
        for server in self.servers.values_mut() {
            server.start().await?;
        }
        Ok(())
    }

    pub async fn stop_all(&mut self) -> Result<()> {
        for server in self.servers.values_mut() {
            match server.stop().await {
                Ok(()) | Err(HttpError::NotRunning) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Apply a new configuration snapshot: existing servers are rebuilt from
    /// their replay lists (and restarted if running), new entries are
    /// created, and servers that disappeared are shut down and dropped.
    pub async fn update_configs(&mut self, cfg: &AppConfig) -> Result<()> {
        for server_cfg in &cfg.http.servers {
            match self.servers.get_mut(&server_cfg.name) {
                Some(server) => {
                    server.update_config(server_cfg.clone()).await?;
                }
                None => {
                    let server = HttpServer::new(server_cfg.name.clone(), server_cfg.clone())?;
                    self.servers.insert(server_cfg.name.clone(), server);
                    info!(server = %server_cfg.name, "http server added from configuration");
                }
            }
        }

        let keep: Vec<String> = cfg.http.servers.iter().map(|s| s.name.clone()).collect();
        let dropped: Vec<String> = self
            .servers
            .keys()
            .filter(|name| !keep.contains(name))
            .cloned()
            .collect();
        for name in dropped {
            if let Some(mut server) = self.servers.remove(&name) {
                match server.stop().await {
                    Ok(()) | Err(HttpError::NotRunning) => {}
                    Err(e) => return Err(e),
                }
                info!(server = %name, "http server removed from configuration");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonyx_config::HttpServerConfig;

    fn config_with(names: &[&str]) -> AppConfig {
        let mut cfg = AppConfig::default();
        for name in names {
            cfg.http.servers.push(HttpServerConfig {
                name: name.to_string(),
                addr: "127.0.0.1:0".into(),
                ..Default::default()
            });
        }
        cfg
    }

    #[test]
    fn builds_one_server_per_config_entry() {
        let manager = HttpManager::from_config(&config_with(&["public", "internal"])).unwrap();
        assert!(manager.server("public").is_ok());
        assert!(manager.server("internal").is_ok());
        assert!(matches!(
            manager.server("ghost"),
            Err(HttpError::UnknownServer(_))
        ));
    }

    #[tokio::test]
    async fn update_adds_and_removes_servers() {
        let mut manager = HttpManager::from_config(&config_with(&["a"])).unwrap();

        manager.update_configs(&config_with(&["a", "b"])).await.unwrap();
        assert!(manager.server("b").is_ok());

        manager.update_configs(&config_with(&["b"])).await.unwrap();
        assert!(manager.server("a").is_err());
        assert!(manager.server("b").is_ok());
    }

    #[tokio::test]
    async fn update_restarts_running_servers() {
        let mut manager = HttpManager::from_config(&config_with(&["a"])).unwrap();
        manager.start_all().await.unwrap();
        assert!(manager.server("a").unwrap().is_running());

        manager.update_configs(&config_with(&["a"])).await.unwrap();
        assert!(manager.server("a").unwrap().is_running());

        manager.stop_all().await.unwrap();
        assert!(!manager.server("a").unwrap().is_running());
    }
}
