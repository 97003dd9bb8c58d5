//! Configuration validation.
//!
//! # Responsibilities
//! - Pre-check the merged raw table and report every problem found
//! - Provide the field checks that section construction enforces
//!
//! # Design Decisions
//! - `validate_config` never fails a load; its output is logged by the loader
//! - Both paths share the `check_*` functions, so diagnostics match enforcement
//! - Returns all validation errors, not just first

use toml::{Table, Value};

use crate::safety::SafetyMode;

pub const TRANSPORTS: [&str; 4] = ["stdio", "sse", "http", "streamable-http"];

pub const LOG_LEVELS: [&str; 8] = [
    "trace", "debug", "info", "warn", "warning", "error", "critical", "fatal",
];

pub const BROWSER_PROVIDERS: [&str; 3] = ["local", "browserbase", "browser-use"];

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path, e.g. `server.port`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("'{}' is not one of {}", value, allowed.join(", ")),
        ))
    }
}

pub fn check_transport(transport: &str) -> Result<(), ValidationError> {
    one_of("server.transport", transport, &TRANSPORTS)
}

pub fn check_port(port: i64) -> Result<(), ValidationError> {
    if (1..=65535).contains(&port) {
        Ok(())
    } else {
        Err(ValidationError::new("server.port", format!("{port} is outside 1-65535")))
    }
}

/// Severity names are matched case-insensitively.
pub fn check_log_level(level: &str) -> Result<(), ValidationError> {
    one_of("server.log_level", &level.to_ascii_lowercase(), &LOG_LEVELS)
}

pub fn check_browser_provider(provider: &str) -> Result<(), ValidationError> {
    one_of("browser.provider", provider, &BROWSER_PROVIDERS)
}

pub fn check_sample_rate(rate: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(ValidationError::new("metrics.sample_rate", format!("{rate} is outside 0.0-1.0")))
    }
}

fn check_safety_mode(mode: &str) -> Result<(), ValidationError> {
    // Only the canonical spellings are accepted in files.
    one_of("safety.mode", mode, &SafetyMode::NAMES)
}

fn field<'a>(raw: &'a Table, section: &str, key: &str) -> Option<&'a Value> {
    raw.get(section)?.as_table()?.get(key)
}

fn expect_str<'a>(name: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::new(name, format!("expected a string, found {}", value.type_str())))
}

/// Check the merged raw table against the per-section constraints.
pub fn validate_config(raw: &Table) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for section in ["server", "safety", "browser", "metrics", "logging", "kubernetes", "admin"] {
        if let Some(value) = raw.get(section) {
            if !value.is_table() {
                errors.push(ValidationError::new(section, "expected a table"));
            }
        }
    }

    if let Some(value) = field(raw, "server", "transport") {
        if let Err(e) = expect_str("server.transport", value).and_then(check_transport) {
            errors.push(e);
        }
    }

    if let Some(value) = field(raw, "server", "port") {
        match value.as_integer() {
            Some(port) => {
                if let Err(e) = check_port(port) {
                    errors.push(e);
                }
            }
            None => errors.push(ValidationError::new(
                "server.port",
                format!("expected an integer, found {}", value.type_str()),
            )),
        }
    }

    if let Some(value) = field(raw, "server", "log_level") {
        if let Err(e) = expect_str("server.log_level", value).and_then(check_log_level) {
            errors.push(e);
        }
    }

    if let Some(value) = field(raw, "safety", "mode") {
        if let Err(e) = expect_str("safety.mode", value).and_then(check_safety_mode) {
            errors.push(e);
        }
    }

    if let Some(value) = field(raw, "browser", "provider") {
        if let Err(e) = expect_str("browser.provider", value).and_then(check_browser_provider) {
            errors.push(e);
        }
    }

    if let Some(value) = field(raw, "metrics", "sample_rate") {
        let rate = match value {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        };
        match rate {
            Some(rate) => {
                if let Err(e) = check_sample_rate(rate) {
                    errors.push(e);
                }
            }
            None => errors.push(ValidationError::new(
                "metrics.sample_rate",
                format!("expected a number, found {}", value.type_str()),
            )),
        }
    }

    errors
}
