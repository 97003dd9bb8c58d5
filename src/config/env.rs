//! Environment variable overrides.
//!
//! Each entry maps one variable onto one `(section, key)` with a type
//! conversion. A value that fails to convert is logged and skipped; the other
//! overrides still apply.

use std::collections::HashMap;

use toml::{Table, Value};

/// Where variable lookups go. Tests use `Fixed` to avoid touching the process env.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    #[default]
    Process,
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvSource::Fixed(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        match self {
            EnvSource::Process => std::env::var(name).ok(),
            EnvSource::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

/// Target type of an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Int,
    Bool,
    Float,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert '{value}' to {expected}")]
pub struct ConversionError {
    pub value: String,
    pub expected: &'static str,
}

impl ValueKind {
    pub fn convert(self, raw: &str) -> Result<Value, ConversionError> {
        let raw = raw.trim();
        let fail = |expected| ConversionError {
            value: raw.to_string(),
            expected,
        };

        match self {
            ValueKind::Str => Ok(Value::String(raw.to_string())),
            ValueKind::Int => raw.parse::<i64>().map(Value::Integer).map_err(|_| fail("an integer")),
            ValueKind::Float => raw.parse::<f64>().map(Value::Float).map_err(|_| fail("a number")),
            ValueKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Value::Boolean(true)),
                "0" | "false" | "no" | "off" => Ok(Value::Boolean(false)),
                _ => Err(fail("a boolean")),
            },
        }
    }
}

/// One environment variable override.
#[derive(Debug, Clone, Copy)]
pub struct EnvOverride {
    pub var: &'static str,
    pub section: &'static str,
    pub key: &'static str,
    pub kind: ValueKind,
}

const fn entry(var: &'static str, section: &'static str, key: &'static str, kind: ValueKind) -> EnvOverride {
    EnvOverride { var, section, key, kind }
}

/// Applied in order; no two entries share a target.
pub const ENV_OVERRIDES: &[EnvOverride] = &[
    entry("MCP_TRANSPORT", "server", "transport", ValueKind::Str),
    entry("MCP_HOST", "server", "host", ValueKind::Str),
    entry("MCP_PORT", "server", "port", ValueKind::Int),
    entry("MCP_DEBUG", "server", "debug", ValueKind::Bool),
    entry("MCP_LOG_LEVEL", "server", "log_level", ValueKind::Str),
    entry("MCP_WATCH_CONFIG", "server", "watch_config", ValueKind::Bool),
    entry("MCP_LOG_FORMAT", "logging", "format", ValueKind::Str),
    entry("MCP_LOG_FILE", "logging", "file", ValueKind::Str),
    entry("MCP_SAFETY_MODE", "safety", "mode", ValueKind::Str),
    entry("MCP_BROWSER_ENABLED", "browser", "enabled", ValueKind::Bool),
    entry("MCP_BROWSER_PROVIDER", "browser", "provider", ValueKind::Str),
    entry("MCP_BROWSER_HEADLESS", "browser", "headless", ValueKind::Bool),
    entry("MCP_BROWSER_CDP_URL", "browser", "cdp_url", ValueKind::Str),
    entry("BROWSERBASE_API_KEY", "browser", "api_key", ValueKind::Str),
    entry("BROWSERBASE_PROJECT_ID", "browser", "project_id", ValueKind::Str),
    entry("MCP_METRICS_ENABLED", "metrics", "enabled", ValueKind::Bool),
    entry("MCP_TRACING_ENABLED", "metrics", "tracing_enabled", ValueKind::Bool),
    entry("OTEL_EXPORTER_OTLP_ENDPOINT", "metrics", "endpoint", ValueKind::Str),
    entry("MCP_TRACE_SAMPLE_RATE", "metrics", "sample_rate", ValueKind::Float),
    entry("KUBECONFIG", "kubernetes", "kubeconfig", ValueKind::Str),
    entry("MCP_K8S_CONTEXT", "kubernetes", "context", ValueKind::Str),
    entry("MCP_K8S_NAMESPACE", "kubernetes", "namespace", ValueKind::Str),
    entry("MCP_K8S_TIMEOUT", "kubernetes", "timeout_secs", ValueKind::Int),
];

/// Write every set and convertible variable into `raw`. Returns how many applied.
pub fn apply_env_overrides(raw: &mut Table, env: &EnvSource) -> usize {
    let mut applied = 0;

    for item in ENV_OVERRIDES {
        let Some(text) = env.get(item.var) else {
            continue;
        };

        let value = match item.kind.convert(&text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(var = item.var, error = %e, "Ignoring environment override");
                continue;
            }
        };

        let section = raw
            .entry(item.section.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !section.is_table() {
            *section = Value::Table(Table::new());
        }
        if let Value::Table(section) = section {
            section.insert(item.key.to_string(), value);
            tracing::debug!(var = item.var, section = item.section, key = item.key, "Applied environment override");
            applied += 1;
        }
    }

    applied
}
