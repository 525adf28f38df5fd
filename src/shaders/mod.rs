//! Shader catalog and hot-reload system
//!
//! Effect programs are embedded at build time. With hot reload enabled the
//! `effects/` directory is watched and edited files are swapped into the
//! catalog through [`ShaderCatalog::reload_file`].

mod catalog;

pub use catalog::*;

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::{Duration, Instant};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::settings::CompositorSettings;

/// Directory holding the effect shader sources
pub fn shaders_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("src").join("shaders").join("effects")
}

/// Watches shader files for changes and signals when reloading is needed
pub struct ShaderWatcher {
    /// Kept alive to maintain the watch
    _watcher: RecommendedWatcher,
    receiver: Receiver<Result<Event, notify::Error>>,
    last_change: Option<Instant>,
    debounce_duration: Duration,
    pending_path: Option<PathBuf>,
}

impl ShaderWatcher {
    /// Watch the built-in shader directory
    pub fn new() -> Result<Self, notify::Error> {
        Self::watch(shaders_dir())
    }

    /// Watcher for the built-in directory when hot reload is enabled in
    /// `settings`. Watch failures are logged and disable hot reload.
    pub fn from_settings(settings: &CompositorSettings) -> Option<Self> {
        if !settings.shader_hot_reload {
            return None;
        }
        match Self::new() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(target: "foilcard::shaders", error = %e, "Failed to start shader watcher");
                None
            }
        }
    }

    /// Watch an arbitrary directory of `.wgsl` files
    pub fn watch(dir: PathBuf) -> Result<Self, notify::Error> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        tracing::info!(
            target: "foilcard::shaders",
            dir = %dir.display(),
            "Shader hot-reload enabled"
        );
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            last_change: None,
            debounce_duration: Duration::from_millis(100),
            pending_path: None,
        })
    }

    /// Poll for shader changes
    ///
    /// Returns `Some(path)` once a `.wgsl` file changed and the debounce
    /// period has passed since the last change.
    pub fn poll(&mut self) -> Option<PathBuf> {
        loop {
            match self.receiver.try_recv() {
                Ok(Ok(event)) => {
                    for path in event.paths {
                        if path.extension().is_some_and(|ext| ext == "wgsl") {
                            self.last_change = Some(Instant::now());
                            self.pending_path = Some(path);
                        }
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(target: "foilcard::shaders", error = ?e, "Shader watcher error");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!(target: "foilcard::shaders", "Shader watcher channel disconnected");
                    break;
                }
            }
        }

        if let (Some(last), Some(path)) = (self.last_change, self.pending_path.take()) {
            if last.elapsed() >= self.debounce_duration {
                self.last_change = None;
                tracing::debug!(target: "foilcard::shaders", path = %path.display(), "Shader changed");
                return Some(path);
            }
            self.pending_path = Some(path);
        }

        None
    }

    /// Poll and apply a pending change to `catalog`.
    ///
    /// Reload failures are logged and leave the previous program in place.
    pub fn poll_into(&mut self, catalog: &mut ShaderCatalog) -> Vec<crate::effects::EffectKind> {
        let Some(path) = self.poll() else {
            return Vec::new();
        };
        match catalog.reload_file(&path) {
            Ok(kinds) => kinds,
            Err(e) => {
                tracing::warn!(target: "foilcard::shaders", error = %e, "Shader reload failed");
                Vec::new()
            }
        }
    }
}
