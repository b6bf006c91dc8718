//! Configuration change events.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a configuration change originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    /// The watched configuration file changed on disk.
    File,
    /// A reload was requested programmatically.
    Manual,
}

impl std::fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Broadcast to subscribers after a new configuration snapshot has been
/// validated and installed. Consumers rebuild from the shared snapshot; the
/// event itself carries no configuration data.
#[derive(Debug, Clone)]
pub struct ConfigChangeEvent {
    pub source: ChangeSource,
    pub path: Option<PathBuf>,
}

impl ConfigChangeEvent {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ChangeSource::File,
            path: Some(path.into()),
        }
    }

    pub fn manual() -> Self {
        Self {
            source: ChangeSource::Manual,
            path: None,
        }
    }
}
