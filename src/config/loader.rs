//! Configuration loading from disk and the environment.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::config::env::{apply_env_overrides, EnvSource};
use crate::config::merge::deep_merge;
use crate::config::schema::EffectiveConfig;
use crate::config::validation::validate_config;

/// Directory name under the platform config dir.
pub const APP_DIR: &str = "kube-mcp";
pub const MAIN_FILE: &str = "config.toml";
pub const DROPIN_DIR: &str = "config.d";
const CONFIG_EXTENSION: &str = "toml";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Standard file locations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPaths {
    pub main_file: Option<PathBuf>,
    pub dropin_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// `<config_dir>/kube-mcp/config.toml` and `<config_dir>/kube-mcp/config.d/`.
    ///
    /// Both are `None` on platforms without a config directory.
    pub fn standard() -> Self {
        match dirs::config_dir() {
            Some(dir) => Self::in_dir(&dir.join(APP_DIR)),
            None => Self::default(),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            main_file: Some(dir.join(MAIN_FILE)),
            dropin_dir: Some(dir.join(DROPIN_DIR)),
        }
    }
}

/// Server settings given on the command line. Applied after every other source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub transport: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

impl CliOverrides {
    fn to_table(&self) -> Table {
        let mut server = Table::new();
        if let Some(transport) = &self.transport {
            server.insert("transport".into(), Value::String(transport.clone()));
        }
        if let Some(host) = &self.host {
            server.insert("host".into(), Value::String(host.clone()));
        }
        if let Some(port) = self.port {
            server.insert("port".into(), Value::Integer(i64::from(port)));
        }
        if let Some(level) = &self.log_level {
            server.insert("log_level".into(), Value::String(level.clone()));
        }

        let mut table = Table::new();
        if !server.is_empty() {
            table.insert("server".into(), Value::Table(server));
        }
        table
    }
}

/// Builds `EffectiveConfig` snapshots. Cheap to clone; reloads reuse the same loader,
/// so an explicit `--config` path survives every reload.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    paths: ConfigPaths,
    explicit: Option<PathBuf>,
    skip_env: bool,
    env: EnvSource,
    overrides: CliOverrides,
}

impl ConfigLoader {
    pub fn new(paths: ConfigPaths) -> Self {
        Self {
            paths,
            ..Self::default()
        }
    }

    pub fn with_explicit_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    pub fn skip_env(mut self, skip: bool) -> Self {
        self.skip_env = skip;
        self
    }

    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    pub fn with_overrides(mut self, overrides: CliOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn explicit_path(&self) -> Option<&Path> {
        self.explicit.as_deref()
    }

    /// Directories worth watching for changes.
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = Vec::new();
        let main_parent = self.paths.main_file.as_deref().and_then(Path::parent);
        let explicit_parent = self.explicit.as_deref().and_then(Path::parent);
        for dir in [main_parent, self.paths.dropin_dir.as_deref(), explicit_parent]
            .into_iter()
            .flatten()
        {
            if dir.is_dir() && !found.iter().any(|d| d == dir) {
                found.push(dir.to_path_buf());
            }
        }
        found
    }

    /// Every file that would be merged, in merge order.
    pub fn config_files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files = Vec::new();
        if let Some(main) = &self.paths.main_file {
            if main.is_file() {
                files.push(main.clone());
            }
        }
        if let Some(dir) = &self.paths.dropin_dir {
            files.extend(dropin_files(dir)?);
        }
        if let Some(explicit) = &self.explicit {
            if explicit.is_file() {
                files.push(explicit.clone());
            }
        }
        Ok(files)
    }

    /// Merge every source into a raw table, without typed conversion.
    pub fn load_raw(&self) -> Result<Table, ConfigError> {
        let mut raw = Table::new();

        if let Some(main) = &self.paths.main_file {
            if main.is_file() {
                merge_file(&mut raw, main);
            } else {
                tracing::debug!(path = %main.display(), "No main config file");
            }
        }

        if let Some(dir) = &self.paths.dropin_dir {
            for file in dropin_files(dir)? {
                merge_file(&mut raw, &file);
            }
        }

        if let Some(explicit) = &self.explicit {
            if explicit.is_file() {
                merge_file(&mut raw, explicit);
            } else {
                tracing::warn!(path = %explicit.display(), "Config file given on the command line does not exist");
            }
        }

        if !self.skip_env {
            apply_env_overrides(&mut raw, &self.env);
        }

        deep_merge(&mut raw, self.overrides.to_table());

        Ok(raw)
    }

    /// Load the effective configuration.
    ///
    /// Malformed files and invalid fields are logged, not returned. The only
    /// error is an unreadable drop-in directory.
    pub fn load(&self) -> Result<EffectiveConfig, ConfigError> {
        let raw = self.load_raw()?;

        for error in validate_config(&raw) {
            tracing::warn!(field = %error.field, problem = %error.message, "Invalid configuration value");
        }

        Ok(EffectiveConfig::from_raw(raw))
    }
}

/// Load from the standard locations plus an optional explicit file.
pub fn load_config(explicit: Option<&Path>, skip_env: bool) -> Result<EffectiveConfig, ConfigError> {
    ConfigLoader::new(ConfigPaths::standard())
        .with_explicit_path(explicit.map(Path::to_path_buf))
        .skip_env(skip_env)
        .load()
}

/// Read and parse one config file.
pub fn read_fragment(path: &Path) -> Result<Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    content.parse::<Table>().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn merge_file(raw: &mut Table, path: &Path) {
    match read_fragment(path) {
        Ok(fragment) => {
            deep_merge(raw, fragment);
            tracing::debug!(path = %path.display(), "Merged config file");
        }
        Err(e) => {
            tracing::error!(error = %e, "Skipping config file");
        }
    }
}

/// `*.toml` files in `dir`, sorted by name.
///
/// A missing directory, or a path that is not a directory, is empty. Only a
/// directory that exists but cannot be listed is an error.
fn dropin_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if dir.exists() && !dir.is_dir() {
        tracing::warn!(path = %dir.display(), "Drop-in path is not a directory, ignoring it");
        return Ok(Vec::new());
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == CONFIG_EXTENSION))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
