//! Safety mode enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Enforcement level applied to cluster-mutating tool calls.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyMode {
    /// Every operation is allowed.
    #[default]
    Normal = 0,
    /// Writes and destructive operations are blocked.
    ReadOnly = 1,
    /// Only destructive operations are blocked.
    DisableDestructive = 2,
}

impl SafetyMode {
    /// Accepted spellings in config files, env vars and CLI flags.
    pub const NAMES: [&'static str; 3] = ["normal", "read-only", "disable-destructive"];

    pub fn as_str(self) -> &'static str {
        match self {
            SafetyMode::Normal => "normal",
            SafetyMode::ReadOnly => "read-only",
            SafetyMode::DisableDestructive => "disable-destructive",
        }
    }

    /// Human readable summary shown by status displays.
    pub fn description(self) -> &'static str {
        match self {
            SafetyMode::Normal => "All operations are allowed",
            SafetyMode::ReadOnly => "Read-only mode: write and destructive operations are blocked",
            SafetyMode::DisableDestructive => {
                "Destructive operations (delete, drain, uninstall) are blocked; other writes are allowed"
            }
        }
    }
}

impl From<u8> for SafetyMode {
    fn from(val: u8) -> Self {
        match val {
            1 => SafetyMode::ReadOnly,
            2 => SafetyMode::DisableDestructive,
            _ => SafetyMode::Normal,
        }
    }
}

impl fmt::Display for SafetyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no safety mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid safety mode '{0}', expected one of: normal, read-only, disable-destructive")]
pub struct ParseSafetyModeError(pub String);

impl FromStr for SafetyMode {
    type Err = ParseSafetyModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "normal" => Ok(SafetyMode::Normal),
            "read-only" | "readonly" => Ok(SafetyMode::ReadOnly),
            "disable-destructive" => Ok(SafetyMode::DisableDestructive),
            _ => Err(ParseSafetyModeError(s.to_string())),
        }
    }
}
