//! Configuration schema definitions.
//!
//! Every section derives Serde traits and defaults each missing field, so a
//! config file only needs the keys it changes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::config::validation::{
    check_browser_provider, check_log_level, check_port, check_sample_rate, check_transport,
    ValidationError,
};
use crate::safety::SafetyMode;

const REDACTED: &str = "********";

/// Root configuration snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EffectiveConfig {
    /// MCP transport and listener settings.
    pub server: ServerConfig,

    /// Safety gate settings.
    pub safety: SafetyConfig,

    /// Browser automation integration.
    pub browser: BrowserConfig,

    /// Metrics and tracing.
    pub metrics: MetricsConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Kubernetes client settings.
    pub kubernetes: KubernetesConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Unrecognized top-level entries, kept verbatim.
    pub custom: BTreeMap<String, Value>,
}

impl EffectiveConfig {
    /// Build typed sections from a merged raw table.
    ///
    /// A section that fails to deserialize or check falls back to its defaults.
    pub fn from_raw(mut raw: Table) -> Self {
        let server = build_section(&mut raw);
        let safety = build_section(&mut raw);
        let browser = build_section(&mut raw);
        let metrics = build_section(&mut raw);
        let logging = build_section(&mut raw);
        let kubernetes = build_section(&mut raw);
        let admin = build_section(&mut raw);

        Self {
            server,
            safety,
            browser,
            metrics,
            logging,
            kubernetes,
            admin,
            custom: raw.into_iter().collect(),
        }
    }

    /// Copy safe to show on status endpoints.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.browser.api_key.is_some() {
            copy.browser.api_key = Some(REDACTED.to_string());
        }
        if !copy.admin.api_key.is_empty() {
            copy.admin.api_key = REDACTED.to_string();
        }
        copy
    }
}

/// A top-level config table with its own construction checks.
pub trait Section: Default + DeserializeOwned {
    /// Table name in the config file.
    const NAME: &'static str;

    fn check(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

fn build_section<S: Section>(raw: &mut Table) -> S {
    let Some(value) = raw.remove(S::NAME) else {
        return S::default();
    };

    let section = match value.try_into::<S>() {
        Ok(section) => section,
        Err(e) => {
            tracing::warn!(section = S::NAME, error = %e, "Invalid config section, using defaults");
            return S::default();
        }
    };

    match section.check() {
        Ok(()) => section,
        Err(e) => {
            tracing::warn!(section = S::NAME, error = %e, "Invalid config section, using defaults");
            S::default()
        }
    }
}

/// Server transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// One of stdio, sse, http, streamable-http.
    pub transport: String,

    pub host: String,

    pub port: u16,

    /// Forces debug logging.
    pub debug: bool,

    /// Standard severity name (DEBUG, INFO, WARNING, ...).
    pub log_level: String,

    /// Reload automatically when config files change.
    pub watch_config: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
            log_level: "INFO".to_string(),
            watch_config: false,
        }
    }
}

impl Section for ServerConfig {
    const NAME: &'static str = "server";

    fn check(&self) -> Result<(), ValidationError> {
        check_transport(&self.transport)?;
        check_port(i64::from(self.port))?;
        check_log_level(&self.log_level)
    }
}

/// Safety gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub mode: SafetyMode,
}

impl Section for SafetyConfig {
    const NAME: &'static str = "safety";
}

/// Browser automation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub enabled: bool,

    /// One of local, browserbase, browser-use.
    pub provider: String,

    pub headless: bool,

    /// Cloud provider credentials.
    pub api_key: Option<String>,
    pub project_id: Option<String>,

    /// Connect to an existing browser over CDP instead of launching one.
    pub cdp_url: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "local".to_string(),
            headless: true,
            api_key: None,
            project_id: None,
            cdp_url: None,
        }
    }
}

impl Section for BrowserConfig {
    const NAME: &'static str = "browser";

    fn check(&self) -> Result<(), ValidationError> {
        check_browser_provider(&self.provider)
    }
}

/// Metrics and tracing settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Expose Prometheus metrics.
    pub enabled: bool,

    /// Emit a span per sampled tool call.
    pub tracing_enabled: bool,

    /// OTLP collector endpoint, passed through to the embedding server.
    pub endpoint: Option<String>,

    /// Fraction of tool calls traced, 0.0 to 1.0.
    pub sample_rate: f64,

    /// Prometheus exporter bind address.
    pub prometheus_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tracing_enabled: false,
            endpoint: None,
            sample_rate: 1.0,
            prometheus_address: "127.0.0.1:9090".to_string(),
        }
    }
}

impl Section for MetricsConfig {
    const NAME: &'static str = "metrics";

    fn check(&self) -> Result<(), ValidationError> {
        check_sample_rate(self.sample_rate)
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Log output settings. The level lives in `server.log_level`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,

    /// Append logs here instead of stderr.
    pub file: Option<PathBuf>,
}

impl Section for LoggingConfig {
    const NAME: &'static str = "logging";
}

/// Kubernetes client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KubernetesConfig {
    /// Defaults to the client's own lookup (`~/.kube/config`).
    pub kubeconfig: Option<PathBuf>,

    pub context: Option<String>,

    pub namespace: String,

    /// Per-command timeout for kubectl and helm.
    pub timeout_secs: u64,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            namespace: "default".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Section for KubernetesConfig {
    const NAME: &'static str = "kubernetes";
}

/// Admin API settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    pub enabled: bool,

    pub bind_address: String,

    /// Bearer token. Requests are rejected while this is empty.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8081".to_string(),
            api_key: String::new(),
        }
    }
}

impl Section for AdminConfig {
    const NAME: &'static str = "admin";
}
