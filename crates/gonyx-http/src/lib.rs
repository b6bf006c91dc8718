//! HTTP serving for Gonyx applications.
//!
//! The interesting part of this crate is the route registrar: servers declare
//! a set of API versions up front, named groups materialize as version-crossed
//! subtrees, and each route names the versions and groups it targets. The
//! registrar resolves that cross product to concrete mount points (see
//! [`registrar`] for the exact rules) and retains every accepted declaration
//! so the whole router can be rebuilt from scratch. That is how configuration
//! reloads work: tear down, replay, serve.
//!
//! ```ignore
//! let mut manager = HttpManager::from_config(&cfg)?;
//! let server = manager.server_mut("default")?;
//! server.add_group(GroupSpec::new("admin"));
//! server.add_route(
//!     RouteSpec::get("/users", list_users)
//!         .named("users.list")
//!         .versions(["all"])
//!         .groups(["admin"]),
//! )?;
//! manager.start_all().await?;
//! ```

mod error;
mod manager;
pub mod middleware;
pub mod registrar;
mod route;
mod server;

pub use error::{HttpError, Result};
pub use manager::HttpManager;
pub use registrar::{Destination, Registrar, VERSION_ALL};
pub use route::{GroupSpec, RouteInfo, RouteSpec, RouterTransform};
pub use server::HttpServer;
