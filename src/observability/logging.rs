//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from the loaded config
//! - Re-apply the log level when the config is reloaded
//!
//! # Design Decisions
//! - `RUST_LOG` always wins over the config file
//! - JSON format for production, text for development
//! - Writes to stderr (or `logging.file`), never stdout

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::config::{EffectiveConfig, LogFormat, ServerConfig};
use crate::lifecycle::reload::SubscriberError;

/// Swaps the active filter after a reload.
pub type LogReloadHandle = reload::Handle<EnvFilter, Registry>;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot open log file: {0}")]
    File(#[from] io::Error),

    #[error("logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Map Python-style severity names onto tracing levels.
pub fn level_directive(server: &ServerConfig) -> &'static str {
    if server.debug {
        return "debug";
    }
    match server.log_level.to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        _ => "info",
    }
}

fn filter_for(server: &ServerConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_directive(server)))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &EffectiveConfig) -> Result<LogReloadHandle, LoggingError> {
    let (filter, handle) = reload::Layer::new(filter_for(&config.server));

    let to_file = config.logging.file.is_some();
    let writer = match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::stderr),
    };

    let (json, text) = match config.logging.format {
        LogFormat::Json => (Some(fmt::layer().json().with_writer(writer)), None),
        LogFormat::Text => (None, Some(fmt::layer().with_ansi(!to_file).with_writer(writer))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()?;

    Ok(handle)
}

/// Reload subscriber that re-applies `server.log_level` / `server.debug`.
pub fn log_level_subscriber(
    handle: LogReloadHandle,
) -> impl Fn(&EffectiveConfig) -> Result<(), SubscriberError> + Send + Sync + 'static {
    move |config: &EffectiveConfig| {
        handle.reload(filter_for(&config.server))?;
        tracing::debug!(level = level_directive(&config.server), "Log level re-applied");
        Ok(())
    }
}
