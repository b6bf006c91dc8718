//! Route and group declarations.

use axum::Router;
use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{self, MethodRouter};
use std::sync::Arc;

/// A transform applied to a group's subtree when the router is materialized.
/// This is where group-level middleware goes:
///
/// ```ignore
/// GroupSpec::new("admin").with_transform(|r| r.layer(auth_layer()))
/// ```
pub type RouterTransform = Arc<dyn Fn(Router) -> Router + Send + Sync>;

/// Declaration of a named group.
#[derive(Clone)]
pub struct GroupSpec {
    pub name: String,
    pub transform: Option<RouterTransform>,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: None,
        }
    }

    pub fn with_transform(mut self, f: impl Fn(Router) -> Router + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for GroupSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupSpec")
            .field("name", &self.name)
            .field("has_transform", &self.transform.is_some())
            .finish()
    }
}

/// Declaration of a single route.
///
/// The service is an axum [`MethodRouter`], so "the handler" may in fact be a
/// whole composed stack (`get(list).layer(...)`); pass one via
/// [`RouteSpec::with_service`] when a plain handler is not enough.
#[derive(Clone)]
pub struct RouteSpec {
    pub method: Method,
    pub path: String,
    pub service: MethodRouter,
    pub name: String,
    pub versions: Vec<String>,
    pub groups: Vec<String>,
}

impl RouteSpec {
    fn from_parts(method: Method, path: impl Into<String>, service: MethodRouter) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self {
            method,
            path,
            service,
            name: String::new(),
            versions: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn get<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::from_parts(Method::GET, path, routing::get(handler))
    }

    pub fn post<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::from_parts(Method::POST, path, routing::post(handler))
    }

    pub fn put<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::from_parts(Method::PUT, path, routing::put(handler))
    }

    pub fn delete<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::from_parts(Method::DELETE, path, routing::delete(handler))
    }

    pub fn patch<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::from_parts(Method::PATCH, path, routing::patch(handler))
    }

    pub fn options<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::from_parts(Method::OPTIONS, path, routing::options(handler))
    }

    /// Build a route from an explicit method and a pre-composed service.
    pub fn with_service(method: Method, path: impl Into<String>, service: MethodRouter) -> Self {
        Self::from_parts(method, path, service)
    }

    /// Record a global route name for later lookup.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Target version tags. `"all"` fans out to every declared version, `""`
    /// targets the unversioned tree.
    pub fn versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions = versions.into_iter().map(Into::into).collect();
        self
    }

    /// Target named groups.
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

impl std::fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSpec")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("versions", &self.versions)
            .field("groups", &self.groups)
            .finish()
    }
}

/// A registered route as reported by the listing and by-name queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub name: String,
    pub method: String,
    pub path: String,
    /// Full mount paths the handler was attached at. Empty when every
    /// version/group key was unknown (the silent-skip policy).
    pub mounts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok() -> &'static str {
        "ok"
    }

    #[test]
    fn path_gains_leading_slash() {
        let spec = RouteSpec::get("users", ok);
        assert_eq!(spec.path, "/users");
        let spec = RouteSpec::get("/users", ok);
        assert_eq!(spec.path, "/users");
    }

    #[test]
    fn builder_collects_targets() {
        let spec = RouteSpec::post("/items", ok)
            .named("items.create")
            .versions(["v1", "v2"])
            .groups(["admin"]);
        assert_eq!(spec.method, Method::POST);
        assert_eq!(spec.name, "items.create");
        assert_eq!(spec.versions, vec!["v1", "v2"]);
        assert_eq!(spec.groups, vec!["admin"]);
    }
}
