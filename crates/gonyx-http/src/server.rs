//! A single configured HTTP server.
//!
//! Declarations (groups and routes) are validated and retained in order; the
//! axum `Router` is materialized from that replay list every time the server
//! (re)starts. A configuration update therefore never mutates a live router:
//! the old listener is shut down and a fresh router is rebuilt from scratch.

use std::collections::HashMap;
use std::mem;
use std::net::SocketAddr;

use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use gonyx_config::HttpServerConfig;

use crate::error::{HttpError, Result};
use crate::middleware;
use crate::registrar::{Destination, Registrar};
use crate::route::{GroupSpec, RouteInfo, RouteSpec, RouterTransform};

/// A retained declaration. Replay preserves the original interleaving, so a
/// route declared before its group resolves the same way on every rebuild.
#[derive(Clone)]
enum Declaration {
    Group(GroupSpec),
    Route(RouteSpec),
}

struct ServerRuntime {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    local_addr: SocketAddr,
}

pub struct HttpServer {
    name: String,
    config: HttpServerConfig,
    methods: Vec<String>,
    registrar: Registrar,
    declarations: Vec<Declaration>,
    records: Vec<RouteInfo>,
    names: HashMap<String, usize>,
    runtime: Option<ServerRuntime>,
}

impl HttpServer {
    pub fn new(name: impl Into<String>, config: HttpServerConfig) -> Result<Self> {
        let name = name.into();
        if config.addr.parse::<SocketAddr>().is_err() {
            return Err(HttpError::CreateServer {
                name,
                reason: format!("invalid listen address '{}'", config.addr),
            });
        }
        let methods = config.effective_methods();
        let registrar = Registrar::new(config.versions.clone());
        Ok(Self {
            name,
            config,
            methods,
            registrar,
            declarations: Vec::new(),
            records: Vec::new(),
            names: HashMap::new(),
            runtime: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &HttpServerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.runtime.is_some()
    }

    /// Address the listener is bound to, once started. Useful when the
    /// configured port is 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.runtime.as_ref().map(|rt| rt.local_addr)
    }

    /// Declare a named group: a group-only subtree plus one composite subtree
    /// per configured version.
    pub fn add_group(&mut self, group: GroupSpec) {
        self.registrar.declare_group(&group.name);
        self.declarations.push(Declaration::Group(group));
    }

    /// Register a route. The method must be on the configured allow-list;
    /// unknown version/group keys resolve to nothing without error.
    pub fn add_route(&mut self, route: RouteSpec) -> Result<()> {
        if !self.methods.iter().any(|m| m == route.method.as_str()) {
            return Err(HttpError::MethodNotSupported(route.method.to_string()));
        }

        let destinations = self.registrar.resolve(&route.versions, &route.groups);
        let mounts = destinations
            .iter()
            .map(|d| format!("{}{}", d.prefix(), route.path))
            .collect();

        self.records.push(RouteInfo {
            name: route.name.clone(),
            method: route.method.to_string(),
            path: route.path.clone(),
            mounts,
        });
        if !route.name.is_empty() {
            self.names
                .insert(route.name.clone(), self.records.len() - 1);
        }
        self.declarations.push(Declaration::Route(route));
        Ok(())
    }

    /// Register several routes, stopping at the first rejection.
    pub fn add_routes(&mut self, routes: impl IntoIterator<Item = RouteSpec>) -> Result<()> {
        for route in routes {
            self.add_route(route)?;
        }
        Ok(())
    }

    /// Look up a registered route by its global name.
    pub fn route_by_name(&self, name: &str) -> Result<RouteInfo> {
        self.names
            .get(name)
            .map(|&idx| self.records[idx].clone())
            .ok_or_else(|| HttpError::RouteNotFound(name.to_string()))
    }

    /// Every accepted route with its resolved mount paths.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.records.clone()
    }

    /// Materialize the axum router from the replay list. Pure with respect to
    /// retained declarations: building twice yields an identical route set.
    pub fn build_router(&self) -> Router {
        let mut replay = Registrar::new(self.config.versions.clone());
        let mut root = Router::new();
        let mut group_routers: Vec<(String, Router)> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut transforms: HashMap<String, Option<RouterTransform>> = HashMap::new();
        let mut routed_keys: std::collections::HashSet<String> = std::collections::HashSet::new();
        let mut attached: std::collections::HashSet<(String, String)> =
            std::collections::HashSet::new();

        for declaration in &self.declarations {
            match declaration {
                Declaration::Group(group) => {
                    for key in replay.declare_group(&group.name) {
                        group_index.entry(key.clone()).or_insert_with(|| {
                            group_routers.push((key.clone(), Router::new()));
                            group_routers.len() - 1
                        });
                        transforms.insert(key, group.transform.clone());
                    }
                }
                Declaration::Route(route) => {
                    for destination in replay.resolve(&route.versions, &route.groups) {
                        let mount = format!("{}{}", destination.prefix(), route.path);
                        if !attached.insert((mount.clone(), route.method.to_string())) {
                            warn!(
                                server = %self.name,
                                mount = %mount,
                                method = %route.method,
                                "duplicate attachment skipped"
                            );
                            continue;
                        }
                        match destination {
                            Destination::Root => {
                                root = root.route(&route.path, route.service.clone());
                            }
                            Destination::Version(version) => {
                                let path = format!("/{version}{}", route.path);
                                root = root.route(&path, route.service.clone());
                            }
                            Destination::Group(key) => {
                                let idx = group_index[&key];
                                let sub = mem::take(&mut group_routers[idx].1);
                                group_routers[idx].1 =
                                    sub.route(&route.path, route.service.clone());
                                routed_keys.insert(key);
                            }
                        }
                    }
                }
            }
        }

        for (key, sub) in group_routers {
            if !routed_keys.contains(&key) {
                continue;
            }
            let sub = match transforms.get(&key).and_then(|t| t.as_ref()) {
                Some(transform) => transform(sub),
                None => sub,
            };
            let prefix = Destination::Group(key).prefix();
            root = root.nest(&prefix, sub);
        }

        root = middleware::apply(root, &self.config.middlewares);
        // One deadline for the whole exchange: reading the request plus
        // producing the response.
        let deadline = self.config.read_timeout() + self.config.write_timeout();
        root.layer(TimeoutLayer::new(deadline))
    }

    /// Bind and serve in a background task until [`stop`](Self::stop) is
    /// called. Restarts (with a freshly built router) if already running.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.runtime.is_some() {
            self.stop().await?;
        }

        let router = self.build_router();
        let listener = tokio::net::TcpListener::bind(&self.config.addr)
            .await
            .map_err(|source| HttpError::StartServer {
                addr: self.config.addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| HttpError::StartServer {
                addr: self.config.addr.clone(),
                source,
            })?;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let server_name = self.name.clone();
        let handle = tokio::spawn(async move {
            let shutdown = async move {
                let _ = stop_rx.changed().await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(server = %server_name, error = %e, "http server terminated");
            }
        });

        info!(server = %self.name, addr = %local_addr, "http server listening");
        self.runtime = Some(ServerRuntime {
            stop_tx,
            handle,
            local_addr,
        });
        Ok(local_addr)
    }

    /// Gracefully stop the listener.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(runtime) = self.runtime.take() else {
            return Err(HttpError::NotRunning);
        };
        runtime
            .stop_tx
            .send(true)
            .map_err(|e| HttpError::ShutdownServer(e.to_string()))?;
        runtime
            .handle
            .await
            .map_err(|e| HttpError::ShutdownServer(e.to_string()))?;
        info!(server = %self.name, "http server stopped");
        Ok(())
    }

    /// Swap in a new configuration and rebuild all derived state from the
    /// replay list. A running server is restarted on the new configuration.
    pub async fn update_config(&mut self, config: HttpServerConfig) -> Result<()> {
        let was_running = self.runtime.is_some();
        if was_running {
            self.stop()
                .await
                .map_err(|e| HttpError::UpdateServerConfig(e.to_string()))?;
        }

        self.methods = config.effective_methods();
        self.config = config;
        self.rebuild_state();

        if was_running {
            self.start()
                .await
                .map_err(|e| HttpError::UpdateServerConfig(e.to_string()))?;
        }
        Ok(())
    }

    /// Re-derive registrar state, route records and the name index by
    /// replaying retained declarations against the current configuration.
    fn rebuild_state(&mut self) {
        let mut registrar = Registrar::new(self.config.versions.clone());
        let mut records = Vec::with_capacity(self.records.len());
        let mut names = HashMap::new();

        for declaration in &self.declarations {
            match declaration {
                Declaration::Group(group) => {
                    registrar.declare_group(&group.name);
                }
                Declaration::Route(route) => {
                    let mounts = registrar
                        .resolve(&route.versions, &route.groups)
                        .iter()
                        .map(|d| format!("{}{}", d.prefix(), route.path))
                        .collect();
                    records.push(RouteInfo {
                        name: route.name.clone(),
                        method: route.method.to_string(),
                        path: route.path.clone(),
                        mounts,
                    });
                    if !route.name.is_empty() {
                        names.insert(route.name.clone(), records.len() - 1);
                    }
                }
            }
        }

        self.registrar = registrar;
        self.records = records;
        self.names = names;
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = runtime.stop_tx.send(true);
            runtime.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteSpec;

    fn server_config(versions: &[&str]) -> HttpServerConfig {
        HttpServerConfig {
            name: "test".into(),
            addr: "127.0.0.1:0".into(),
            versions: versions.iter().map(|v| v.to_string()).collect(),
            ..Default::default()
        }
    }

    async fn ok() -> &'static str {
        "ok"
    }

    #[test]
    fn unsupported_method_is_rejected_and_not_retained() {
        let mut cfg = server_config(&[]);
        cfg.request_methods = vec!["GET".into()];
        let mut server = HttpServer::new("test", cfg).unwrap();

        let err = server
            .add_route(RouteSpec::post("/users", ok).named("users.create"))
            .unwrap_err();
        assert!(matches!(err, HttpError::MethodNotSupported(m) if m == "POST"));
        assert!(server.routes().is_empty());
        assert!(server.route_by_name("users.create").is_err());
    }

    #[test]
    fn all_versions_with_group_mounts_everywhere() {
        let mut server = HttpServer::new("test", server_config(&["v1", "v2"])).unwrap();
        server.add_group(GroupSpec::new("admin"));
        server
            .add_route(
                RouteSpec::get("/users", ok)
                    .named("users.list")
                    .versions(["all"])
                    .groups(["admin"]),
            )
            .unwrap();

        let info = server.route_by_name("users.list").unwrap();
        assert_eq!(info.mounts, vec!["/v1/admin/users", "/v2/admin/users"]);
    }

    #[test]
    fn unknown_group_attaches_nowhere_without_error() {
        let mut server = HttpServer::new("test", server_config(&["v1"])).unwrap();
        server
            .add_route(RouteSpec::get("/users", ok).named("u").groups(["ghost"]))
            .unwrap();

        let info = server.route_by_name("u").unwrap();
        assert!(info.mounts.is_empty());
    }

    #[test]
    fn route_name_is_global_even_for_subtree_routes() {
        let mut server = HttpServer::new("test", server_config(&["v1"])).unwrap();
        server.add_group(GroupSpec::new("admin"));
        server
            .add_route(
                RouteSpec::get("/x", ok)
                    .named("deep")
                    .versions(["v1"])
                    .groups(["admin"]),
            )
            .unwrap();

        assert_eq!(server.route_by_name("deep").unwrap().mounts, vec!["/v1/admin/x"]);
        let missing = server.route_by_name("nope").unwrap_err();
        assert!(matches!(missing, HttpError::RouteNotFound(_)));
    }

    #[test]
    fn route_listing_reports_every_accepted_route() {
        let mut server = HttpServer::new("test", server_config(&["v1"])).unwrap();
        server.add_route(RouteSpec::get("/a", ok)).unwrap();
        server
            .add_route(RouteSpec::post("/b", ok).versions(["v1"]))
            .unwrap();

        let routes = server.routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].mounts, vec!["/a"]);
        assert_eq!(routes[1].mounts, vec!["/v1/b"]);
    }

    #[test]
    fn rebuild_state_is_idempotent() {
        let mut server = HttpServer::new("test", server_config(&["v1", "v2"])).unwrap();
        server.add_group(GroupSpec::new("admin"));
        server
            .add_route(
                RouteSpec::get("/users", ok)
                    .named("users")
                    .versions(["all"])
                    .groups(["admin"]),
            )
            .unwrap();
        server.add_route(RouteSpec::get("/health", ok)).unwrap();

        let before = server.routes();
        server.rebuild_state();
        server.rebuild_state();
        assert_eq!(server.routes(), before);
    }

    #[test]
    fn route_declared_before_group_misses_it_on_every_build() {
        let mut server = HttpServer::new("test", server_config(&["v1"])).unwrap();
        server
            .add_route(RouteSpec::get("/early", ok).named("early").groups(["admin"]))
            .unwrap();
        server.add_group(GroupSpec::new("admin"));
        server
            .add_route(RouteSpec::get("/late", ok).named("late").groups(["admin"]))
            .unwrap();

        assert!(server.route_by_name("early").unwrap().mounts.is_empty());
        assert_eq!(server.route_by_name("late").unwrap().mounts, vec!["/admin/late"]);

        // Replay keeps the interleaving, so the early route stays unmounted.
        server.rebuild_state();
        assert!(server.route_by_name("early").unwrap().mounts.is_empty());
    }

    #[tokio::test]
    async fn start_stop_round_trip() {
        let mut server = HttpServer::new("test", server_config(&[])).unwrap();
        server.add_route(RouteSpec::get("/ping", ok)).unwrap();

        let addr = server.start().await.unwrap();
        assert!(server.is_running());
        assert_ne!(addr.port(), 0);

        server.stop().await.unwrap();
        assert!(!server.is_running());
        assert!(matches!(server.stop().await, Err(HttpError::NotRunning)));
    }
}
