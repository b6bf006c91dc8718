//! Project scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

const MANIFEST_TEMPLATE: &str = r#"[package]
name = "{{name}}"
version = "0.1.0"
edition = "2024"

[dependencies]
gonyx = "0.1"
tokio = { version = "1", features = ["full"] }
"#;

const MAIN_TEMPLATE: &str = r#"use gonyx::prelude::*;
use gonyx::RouteSpec;

struct Hello;

impl RestfulController for Hello {
    fn name(&self) -> &str {
        "Hello"
    }

    fn routes(&self) -> Vec<RouteSpec> {
        vec![RouteSpec::get("/", || async { "Hello from {{name}}" }).named("hello.index")]
    }
}

#[tokio::main]
async fn main() -> Result<(), gonyx::EngineError> {
    gonyx::observability::init_tracing();

    let mut engine = Engine::from_path(gonyx::resolve_config_path().as_deref())?;
    engine.register_controller("default", &Hello)?;
    engine.enable_hot_reload()?;
    engine.run().await
}
"#;

const CONFIG_TEMPLATE: &str = r#"[app]
name = "{{name}}"
env = "dev"

[logging]
level = "info"

[[http.servers]]
name = "default"
addr = "0.0.0.0:3000"
versions = ["v1"]

[http.servers.middlewares]
order = ["logger"]

# [sql.main]
# dialect = "sqlite"
# file = "{{name}}.db"

# [redis.cache]
# url = "redis://localhost:6379"
# add_app_prefix = true
"#;

/// Create a project directory with a manifest, a starter controller and a
/// starter configuration. Refuses to touch an existing directory.
pub fn create_project(name: &str, parent: &Path) -> Result<PathBuf> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        bail!("project name '{name}' must be alphanumeric (with '-' or '_')");
    }

    let root = parent.join(name);
    if root.exists() {
        bail!("directory '{}' already exists", root.display());
    }

    fs::create_dir_all(root.join("src"))
        .with_context(|| format!("creating '{}'", root.display()))?;

    fs::write(root.join("Cargo.toml"), render(MANIFEST_TEMPLATE, name))?;
    fs::write(root.join("src/main.rs"), render(MAIN_TEMPLATE, name))?;
    fs::write(root.join("gonyx.toml"), render(CONFIG_TEMPLATE, name))?;

    Ok(root)
}

fn render(template: &str, name: &str) -> String {
    template.replace("{{name}}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffold_writes_expected_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = create_project("demo-app", dir.path()).unwrap();

        assert!(root.join("Cargo.toml").exists());
        assert!(root.join("src/main.rs").exists());
        assert!(root.join("gonyx.toml").exists());

        let manifest = fs::read_to_string(root.join("Cargo.toml")).unwrap();
        assert!(manifest.contains("name = \"demo-app\""));

        // The starter config must itself pass validation.
        let cfg = gonyx_config::load_config(root.join("gonyx.toml").to_str()).unwrap();
        assert_eq!(cfg.app.name, "demo-app");
    }

    #[test]
    fn refuses_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        create_project("demo", dir.path()).unwrap();
        assert!(create_project("demo", dir.path()).is_err());
    }

    #[test]
    fn rejects_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        assert!(create_project("../evil", dir.path()).is_err());
        assert!(create_project("", dir.path()).is_err());
    }
}
