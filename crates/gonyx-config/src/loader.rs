//! Configuration loading.
//!
//! Sources are layered: an optional TOML file first, then environment
//! variables with the `GONYX__` prefix (e.g. `GONYX__LOGGING__LEVEL=debug`).
//! The merged tree is deserialized into [`AppConfig`] and validated before it
//! is handed to anyone.

use crate::schema::AppConfig;
use crate::{ConfigError, Result};
use config::{Config, Environment, File};
use std::path::PathBuf;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gonyx.toml";

pub fn load_config(path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();
    match path {
        Some(p) => {
            let pathbuf = PathBuf::from(p);
            if pathbuf.exists() {
                builder = builder.add_source(File::from(pathbuf));
            } else {
                tracing::warn!(path = %p, "config file not found, using defaults and environment");
            }
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path));
            }
        }
    }

    // Environment variable overrides, e.g. GONYX__HTTP__SERVERS is not
    // addressable this way but scalar leaves like GONYX__LOGGING__LEVEL are.
    builder = builder.add_source(
        Environment::with_prefix("GONYX")
            .try_parsing(true)
            .separator("__"),
    );

    let merged: AppConfig = builder.build()?.try_deserialize()?;
    merged.validate().map_err(ConfigError::Validation)?;
    Ok(merged)
}
