//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (serde)
//!     ⊕ <config_dir>/kube-mcp/config.toml
//!     ⊕ <config_dir>/kube-mcp/config.d/*.toml   (sorted by file name)
//!     ⊕ --config <path>
//!     ⊕ env.rs overrides (MCP_PORT, KUBECONFIG, ...)
//!     ⊕ command line overrides
//!     → merge.rs (deep merge, raw toml tables)
//!     → validation.rs (pre-check, logs only)
//!     → schema.rs (typed sections, invalid section → defaults)
//!     → EffectiveConfig (immutable snapshot)
//!
//! On reload signal:
//!     lifecycle::reload re-runs the loader
//!     → atomic swap of Arc<EffectiveConfig>
//!     → subscribers observe the new snapshot
//! ```
//!
//! # Design Decisions
//! - Loading is lenient: a bad file or field never takes the server down
//! - Only failing to enumerate the drop-in directory aborts a load
//! - Unknown top-level tables are kept in `custom`, not dropped

pub mod env;
pub mod loader;
pub mod merge;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use env::EnvSource;
pub use loader::{load_config, CliOverrides, ConfigError, ConfigLoader, ConfigPaths};
pub use schema::{
    AdminConfig, BrowserConfig, EffectiveConfig, KubernetesConfig, LogFormat, LoggingConfig,
    MetricsConfig, SafetyConfig, ServerConfig,
};
pub use validation::{validate_config, ValidationError};
