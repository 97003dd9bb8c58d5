//! Configuration file watcher for hot reload.
//!
//! Editors usually replace files rather than writing in place, so the watcher
//! observes directories and filters for `.toml` paths.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::lifecycle::reload::ReloadCoordinator;

/// Watches the config directories and reloads on change.
pub struct ConfigWatcher {
    dirs: Vec<PathBuf>,
    coordinator: Arc<ReloadCoordinator>,
}

impl ConfigWatcher {
    pub fn new(dirs: Vec<PathBuf>, coordinator: Arc<ReloadCoordinator>) -> Self {
        Self { dirs, coordinator }
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive; dropping it stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let coordinator = self.coordinator.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove())
                        && event
                            .paths
                            .iter()
                            .any(|p| p.extension().is_some_and(|ext| ext == "toml"));
                    if !relevant {
                        return;
                    }

                    tracing::info!(paths = ?event.paths, "Config file change detected, reloading");
                    if let Err(e) = coordinator.reload() {
                        tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                    }
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        for dir in &self.dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
            tracing::info!(path = %dir.display(), "Config watcher started");
        }

        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigLoader, ConfigPaths, EnvSource};
    use crate::safety::SafetyMode;
    use std::fs;
    use std::time::Instant;

    #[tokio::test]
    async fn test_dropin_write_triggers_reload() {
        let dir = tempfile::tempdir().unwrap();
        let dropins = dir.path().join("config.d");
        fs::create_dir_all(&dropins).unwrap();

        let loader = ConfigLoader::new(ConfigPaths::in_dir(dir.path())).with_env(EnvSource::Fixed(Default::default()));
        let watched = loader.watched_dirs();
        assert!(watched.contains(&dropins));

        let coordinator = Arc::new(ReloadCoordinator::from_source(Box::new(loader)).unwrap());
        let _watcher = ConfigWatcher::new(watched, coordinator.clone()).run().unwrap();

        fs::write(dropins.join("50-lockdown.toml"), "[safety]\nmode = \"read-only\"\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while coordinator.current().safety.mode != SafetyMode::ReadOnly && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert!(coordinator.stats().succeeded >= 1);
        assert_eq!(coordinator.current().safety.mode, SafetyMode::ReadOnly);
    }
}
