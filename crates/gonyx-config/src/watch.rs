//! Hot-reload support.
//!
//! The watcher thread reloads and re-validates the file on change (with a
//! 500ms debounce), swaps the shared snapshot only on success, and broadcasts
//! a [`ConfigChangeEvent`]. A failed reload leaves the previous configuration
//! in effect.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, RwLock},
    time::{Duration, Instant},
};

use notify::{Event, RecursiveMode, Watcher, recommended_watcher};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::events::ConfigChangeEvent;
use crate::loader::load_config;
use crate::schema::AppConfig;
use crate::{ConfigError, Result};

/// Shared, swappable configuration snapshot.
pub type SharedConfig = Arc<RwLock<AppConfig>>;

/// Wrap a loaded configuration for sharing.
pub fn new_shared(cfg: AppConfig) -> SharedConfig {
    Arc::new(RwLock::new(cfg))
}

const DEBOUNCE: Duration = Duration::from_millis(500);

/// File watcher that keeps a [`SharedConfig`] up to date.
pub struct ConfigWatcher {
    event_tx: broadcast::Sender<ConfigChangeEvent>,
    // Keeps the watcher thread alive for the lifetime of this handle.
    _thread: Option<std::thread::JoinHandle<()>>,
}

impl ConfigWatcher {
    /// Start watching `path`. If the file does not exist the watcher is
    /// created in a disabled state: subscriptions work but no events fire.
    pub fn start(path: PathBuf, shared: SharedConfig) -> Result<Self> {
        let (event_tx, _) = broadcast::channel(16);

        if !path.exists() {
            warn!(path = ?path, "config file does not exist; watcher disabled");
            return Ok(Self {
                event_tx,
                _thread: None,
            });
        }

        let tx = event_tx.clone();
        let thread = std::thread::Builder::new()
            .name("gonyx-config-watch".into())
            .spawn(move || watch_loop(path, shared, tx))
            .map_err(|e| ConfigError::watcher(format!("failed to spawn watcher thread: {e}")))?;

        Ok(Self {
            event_tx,
            _thread: Some(thread),
        })
    }

    /// Subscribe to configuration change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.event_tx.subscribe()
    }

    /// Reload immediately, outside the file-watch path.
    pub fn reload_now(&self, path: Option<&str>, shared: &SharedConfig) -> Result<()> {
        let new_cfg = load_config(path)?;
        if let Ok(mut guard) = shared.write() {
            *guard = new_cfg;
        }
        let _ = self.event_tx.send(ConfigChangeEvent::manual());
        Ok(())
    }
}

fn watch_loop(
    path: PathBuf,
    shared: SharedConfig,
    tx: broadcast::Sender<ConfigChangeEvent>,
) {
    let last_reload = Arc::new(Mutex::new(Instant::now() - Duration::from_secs(1)));
    let lp = path.clone();
    let lr = last_reload.clone();

    let mut watcher = match recommended_watcher(move |res: std::result::Result<Event, notify::Error>| {
        match res {
            Ok(_event) => {
                let mut last = match lr.lock() {
                    Ok(g) => g,
                    Err(_) => return,
                };
                let now = Instant::now();
                if now.duration_since(*last) < DEBOUNCE {
                    return;
                }
                *last = now;

                match load_config(lp.to_str()) {
                    Ok(new_cfg) => {
                        if let Ok(mut guard) = shared.write() {
                            *guard = new_cfg;
                        }
                        if tx.send(ConfigChangeEvent::file(lp.clone())).is_err() {
                            // No subscribers; the snapshot is still updated.
                        }
                        info!("configuration reloaded successfully");
                    }
                    Err(e) => {
                        error!("configuration reload failed: {e}");
                    }
                }
            }
            Err(e) => error!("watch error: {e}"),
        }
    }) {
        Ok(w) => w,
        Err(e) => {
            error!("failed to start config watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
        error!("failed to watch config file: {e}");
        return;
    }

    loop {
        std::thread::park();
    }
}
