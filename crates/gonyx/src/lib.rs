//! Gonyx, a configuration-driven application framework.
//!
//! A `gonyx.toml` (plus `GONYX__*` environment overrides) declares HTTP
//! servers, SQL instances and Redis instances; the [`Engine`] turns that into
//! running services. Routes are declared against named servers with optional
//! API-version and group targeting, and every declaration is retained so a
//! configuration reload can rebuild the routing state from scratch.
//!
//! ```ignore
//! use gonyx::prelude::*;
//!
//! struct Users;
//!
//! impl RestfulController for Users {
//!     fn name(&self) -> &str { "Users" }
//!     fn routes(&self) -> Vec<RouteSpec> {
//!         vec![RouteSpec::get("/", list).versions(["all"]).named("users.list")]
//!     }
//! }
//!
//! async fn list() -> &'static str { "[]" }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gonyx::EngineError> {
//!     gonyx::observability::init_tracing();
//!     let mut engine = Engine::from_path(gonyx::resolve_config_path().as_deref())?;
//!     engine.register_controller("default", &Users)?;
//!     engine.enable_hot_reload()?;
//!     engine.run().await
//! }
//! ```

mod engine;
pub mod observability;

pub use engine::{
    Engine, EngineError, RestfulController, register_restful_controller, resolve_config_path,
};

// The framework surface, re-exported from the member crates.
pub use gonyx_config::{AppConfig, ConfigError, load_config};
pub use gonyx_http::{
    GroupSpec, HttpError, HttpManager, HttpServer, RouteInfo, RouteSpec, RouterTransform,
};
pub use gonyx_redis::{RedisClient, RedisError, RedisManager};
pub use gonyx_sql::{SqlError, SqlManager, SqlWrapper};

/// Convenient imports for application code.
pub mod prelude {
    pub use crate::engine::{Engine, RestfulController, register_restful_controller};
    pub use gonyx_http::{GroupSpec, RouteSpec};
}
