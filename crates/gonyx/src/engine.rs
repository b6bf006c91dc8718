//! Application bootstrap.
//!
//! The engine owns the shared configuration snapshot and the three managers,
//! wires configuration-change events to manager rebuilds, and drives server
//! lifecycle until shutdown. Everything is an explicit object: construct the
//! engine once in `main`, hand out references, no global state.

use std::path::PathBuf;

use tracing::{error, info};

use gonyx_config::{
    AppConfig, ConfigError, ConfigWatcher, SharedConfig, load_config, new_shared,
};
use gonyx_http::{GroupSpec, HttpError, HttpManager, HttpServer, RouteSpec};
use gonyx_redis::{RedisError, RedisManager};
use gonyx_sql::{SqlError, SqlManager};

use crate::observability;

/// Error types for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Sql(#[from] SqlError),
    #[error(transparent)]
    Redis(#[from] RedisError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// A controller contributing a set of routes under its own named group.
pub trait RestfulController {
    fn name(&self) -> &str;
    fn routes(&self) -> Vec<RouteSpec>;
}

/// Register a controller on a server: the lower-cased controller name is
/// declared as a group and prepended to every route's group list, so the
/// controller's routes live under `/{controller}` (crossed with whatever
/// versions each route names).
pub fn register_restful_controller(
    server: &mut HttpServer,
    controller: &dyn RestfulController,
) -> gonyx_http::Result<()> {
    let controller_name = controller.name().trim().to_lowercase();
    let mut routes = controller.routes();

    if !controller_name.is_empty() {
        server.add_group(GroupSpec::new(controller_name.clone()));
        for route in &mut routes {
            route.groups.insert(0, controller_name.clone());
        }
    }

    server.add_routes(routes)
}

pub struct Engine {
    config_path: Option<String>,
    shared: SharedConfig,
    watcher: Option<ConfigWatcher>,
    http: HttpManager,
    sql: SqlManager,
    redis: RedisManager,
}

impl Engine {
    /// Build an engine from an already-loaded configuration.
    pub fn new(cfg: AppConfig) -> Result<Self> {
        let http = HttpManager::from_config(&cfg)?;
        let sql = SqlManager::from_config(&cfg)?;
        let redis = RedisManager::from_config(&cfg)?;
        Ok(Self {
            config_path: None,
            shared: new_shared(cfg),
            watcher: None,
            http,
            sql,
            redis,
        })
    }

    /// Load configuration from `path` (or `gonyx.toml`) and build the engine.
    /// A `.env` file is read first, if present, so environment overrides work
    /// in local development.
    pub fn from_path(path: Option<&str>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv()
            && !matches!(&e, dotenvy::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("failed to load .env file: {e}");
        }

        let cfg = load_config(path)?;
        observability::apply_logging_level(&cfg.logging.level);
        let mut engine = Self::new(cfg)?;
        engine.config_path = path.map(str::to_string);
        Ok(engine)
    }

    /// A snapshot of the current configuration.
    pub fn config(&self) -> AppConfig {
        self.shared
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn http(&self) -> &HttpManager {
        &self.http
    }

    pub fn http_mut(&mut self) -> &mut HttpManager {
        &mut self.http
    }

    pub fn sql(&self) -> &SqlManager {
        &self.sql
    }

    pub fn redis(&self) -> &RedisManager {
        &self.redis
    }

    /// Register a controller on the named server.
    pub fn register_controller(
        &mut self,
        server_name: &str,
        controller: &dyn RestfulController,
    ) -> Result<()> {
        let server = self.http.server_mut(server_name)?;
        register_restful_controller(server, controller)?;
        Ok(())
    }

    /// Start watching the configuration file; changed snapshots are applied
    /// by tearing managers down and rebuilding them.
    pub fn enable_hot_reload(&mut self) -> Result<()> {
        let path = self
            .config_path
            .clone()
            .unwrap_or_else(|| gonyx_config::loader::DEFAULT_CONFIG_FILE.to_string());
        let watcher = ConfigWatcher::start(PathBuf::from(path), self.shared.clone())?;
        self.watcher = Some(watcher);
        Ok(())
    }

    /// Apply the current shared snapshot to every manager.
    pub async fn apply_config(&mut self) -> Result<()> {
        let cfg = self.config();
        observability::apply_logging_level(&cfg.logging.level);
        self.http.update_configs(&cfg).await?;
        self.sql.update_configs(&cfg).await?;
        self.redis.update_configs(&cfg)?;
        info!("configuration applied to all managers");
        Ok(())
    }

    /// Start every server and serve until ctrl-c, applying configuration
    /// reloads as they arrive.
    pub async fn run(mut self) -> Result<()> {
        self.http.start_all().await?;

        use tokio::sync::broadcast::error::RecvError;

        let mut reload_rx = self.watcher.as_ref().map(|w| w.subscribe());
        loop {
            let channel_closed = match reload_rx.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => break,
                        event = rx.recv() => match event {
                            Ok(event) => {
                                info!(source = %event.source, "configuration change detected");
                                if let Err(e) = self.apply_config().await {
                                    error!("applying reloaded configuration failed: {e}");
                                }
                                false
                            }
                            // Missed events coalesce into one apply.
                            Err(RecvError::Lagged(_)) => {
                                if let Err(e) = self.apply_config().await {
                                    error!("applying reloaded configuration failed: {e}");
                                }
                                false
                            }
                            Err(RecvError::Closed) => true,
                        },
                    }
                }
                None => {
                    let _ = tokio::signal::ctrl_c().await;
                    break;
                }
            };
            if channel_closed {
                // Watcher gone; keep serving without reloads.
                reload_rx = None;
            }
        }

        info!("shutdown signal received");
        self.shutdown().await
    }

    /// Stop servers and release pools.
    pub async fn shutdown(mut self) -> Result<()> {
        self.http.stop_all().await?;
        self.sql.close_all().await;
        self.redis.close_all();
        info!("engine stopped");
        Ok(())
    }
}

/// Resolve the configuration file path the way generated applications do.
///
/// Priority order: `--config <path>` argument, `GONYX_CONFIG` environment
/// variable, then the `gonyx.toml` default.
pub fn resolve_config_path() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config"
            && let Some(path) = args.next()
        {
            return Some(path);
        }
    }
    if let Ok(path) = std::env::var("GONYX_CONFIG")
        && !path.is_empty()
    {
        return Some(path);
    }
    None
}
