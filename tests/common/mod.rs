//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kube_mcp_gate::config::{ConfigError, ConfigLoader, ConfigPaths, EffectiveConfig, EnvSource};
use kube_mcp_gate::dispatch::ToolRegistry;
use kube_mcp_gate::lifecycle::ConfigSource;
use serde_json::json;
use tempfile::TempDir;

/// A throwaway config directory laid out like `<config_dir>/kube-mcp`.
pub struct ConfigTree {
    dir: TempDir,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_main(&self, content: &str) {
        fs::write(self.path().join("config.toml"), content).unwrap();
    }

    pub fn write_dropin(&self, name: &str, content: &str) -> PathBuf {
        let dropins = self.path().join("config.d");
        fs::create_dir_all(&dropins).unwrap();
        let path = dropins.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Put a plain file where the drop-in directory belongs.
    pub fn shadow_dropin_dir(&self) {
        fs::write(self.path().join("config.d"), "not a directory").unwrap();
    }

    /// Loader over this tree with an empty environment.
    pub fn loader(&self) -> ConfigLoader {
        self.loader_with_env(&[])
    }

    pub fn loader_with_env(&self, vars: &[(&str, &str)]) -> ConfigLoader {
        ConfigLoader::new(ConfigPaths::in_dir(self.path()))
            .with_env(EnvSource::fixed(vars.iter().copied()))
    }

    /// Loader over this tree that fails while the returned flag is set.
    pub fn faulty_loader(&self) -> (FaultySource, Arc<AtomicBool>) {
        let failing = Arc::new(AtomicBool::new(false));
        let source = FaultySource {
            loader: self.loader(),
            failing: failing.clone(),
        };
        (source, failing)
    }
}

/// Behaves like an unlistable config directory while `failing` is set.
pub struct FaultySource {
    loader: ConfigLoader,
    failing: Arc<AtomicBool>,
}

impl ConfigSource for FaultySource {
    fn load(&self) -> Result<EffectiveConfig, ConfigError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConfigError::Io {
                path: PathBuf::from("config.d"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
            });
        }
        self.loader.load()
    }
}

/// Flags flipped by the tool bodies of [`kubernetes_registry`].
#[derive(Default)]
pub struct Effects {
    pub pods_deleted: AtomicBool,
    pub deployment_scaled: AtomicBool,
}

impl Effects {
    pub fn deleted(&self) -> bool {
        self.pods_deleted.load(Ordering::SeqCst)
    }

    pub fn scaled(&self) -> bool {
        self.deployment_scaled.load(Ordering::SeqCst)
    }
}

/// A read, a write and a destructive tool whose bodies record that they ran.
pub fn kubernetes_registry(effects: Arc<Effects>) -> ToolRegistry {
    let on_delete = effects.clone();
    let on_scale = effects;
    ToolRegistry::new()
        .register("get_pods", |_| async { Ok(json!([{ "name": "web-0" }])) })
        .register("scale_deployment", move |args| {
            let effects = on_scale.clone();
            async move {
                effects.deployment_scaled.store(true, Ordering::SeqCst);
                Ok(json!({ "replicas": args["replicas"] }))
            }
        })
        .register("delete_pod", move |_| {
            let effects = on_delete.clone();
            async move {
                effects.pods_deleted.store(true, Ordering::SeqCst);
                Ok(json!({ "deleted": true }))
            }
        })
}
