//! The gate every tool invocation passes through.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::config::EffectiveConfig;
use crate::lifecycle::reload::SubscriberError;
use crate::observability::metrics;
use crate::safety::classification::OperationClassification;
use crate::safety::mode::SafetyMode;

/// Outcome of `SafetyGate::is_operation_allowed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub allowed: bool,
    /// Empty when allowed.
    pub reason: String,
}

/// Structured rejection returned instead of running a blocked tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{reason}")]
pub struct OperationBlocked {
    /// Always `false`; kept so the serialized form is self-describing.
    pub allowed: bool,
    pub reason: String,
    pub blocked_by_mode: SafetyMode,
    pub operation_name: String,
}

/// Read-only projection for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeInfo {
    pub mode: SafetyMode,
    pub description: &'static str,
    pub blocked_operations: BTreeSet<String>,
}

/// Holds the process-wide safety mode and answers gate queries.
///
/// Share it behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct SafetyGate {
    mode: AtomicU8,
    classification: Arc<OperationClassification>,
}

impl SafetyGate {
    /// Gate over the built-in Kubernetes tool table.
    pub fn new(mode: SafetyMode) -> Self {
        Self::with_classification(mode, OperationClassification::builtin_shared())
    }

    pub fn with_classification(mode: SafetyMode, classification: Arc<OperationClassification>) -> Self {
        metrics::record_safety_mode(mode);
        Self {
            mode: AtomicU8::new(mode as u8),
            classification,
        }
    }

    pub fn mode(&self) -> SafetyMode {
        SafetyMode::from(self.mode.load(Ordering::Acquire))
    }

    /// Replace the mode. Calls that already passed the gate are unaffected.
    pub fn set_mode(&self, mode: SafetyMode) {
        let previous = SafetyMode::from(self.mode.swap(mode as u8, Ordering::AcqRel));
        if previous != mode {
            tracing::info!(from = %previous, to = %mode, "Safety mode changed");
        }
        metrics::record_safety_mode(mode);
    }

    pub fn classification(&self) -> &OperationClassification {
        &self.classification
    }

    pub fn is_operation_allowed(&self, operation: &str) -> GateDecision {
        match self.check(operation) {
            Ok(()) => GateDecision {
                allowed: true,
                reason: String::new(),
            },
            Err(blocked) => GateDecision {
                allowed: false,
                reason: blocked.reason,
            },
        }
    }

    /// Like `is_operation_allowed`, shaped for `?`.
    pub fn check(&self, operation: &str) -> Result<(), OperationBlocked> {
        let mode = self.mode();
        if !self.classification.is_blocked(mode, operation) {
            return Ok(());
        }

        let reason = match mode {
            SafetyMode::ReadOnly => format!(
                "Operation '{operation}' is blocked: server is running in read-only mode"
            ),
            _ => format!(
                "Operation '{operation}' is blocked: destructive operations are disabled"
            ),
        };
        tracing::warn!(operation = %operation, mode = %mode, "Blocked operation");

        Err(OperationBlocked {
            allowed: false,
            reason,
            blocked_by_mode: mode,
            operation_name: operation.to_string(),
        })
    }

    pub fn mode_info(&self) -> ModeInfo {
        let mode = self.mode();
        ModeInfo {
            mode,
            description: mode.description(),
            blocked_operations: self.classification.blocked_under(mode),
        }
    }

    /// Run `effect` only if `operation` passes the gate.
    pub fn guard<T>(&self, operation: &str, effect: impl FnOnce() -> T) -> Result<T, OperationBlocked> {
        self.check(operation)?;
        Ok(effect())
    }

    /// Async form of [`SafetyGate::guard`]. The future is not even constructed when blocked.
    pub async fn guard_async<F, Fut, T>(&self, operation: &str, effect: F) -> Result<T, OperationBlocked>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.check(operation)?;
        Ok(effect().await)
    }
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new(SafetyMode::Normal)
    }
}

/// Reload subscriber that re-derives the mode from each new snapshot.
///
/// `cli_override` comes from the command line and always beats the file.
pub fn safety_mode_subscriber(
    gate: Arc<SafetyGate>,
    cli_override: Option<SafetyMode>,
) -> impl Fn(&EffectiveConfig) -> Result<(), SubscriberError> + Send + Sync + 'static {
    move |config: &EffectiveConfig| {
        let mode = cli_override.unwrap_or(config.safety.mode);
        if cli_override.is_some() && config.safety.mode != mode {
            tracing::debug!(
                configured = %config.safety.mode,
                effective = %mode,
                "Command line safety mode overrides reloaded config"
            );
        }
        gate.set_mode(mode);
        Ok(())
    }
}
