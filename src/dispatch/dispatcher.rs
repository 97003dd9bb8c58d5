//! Gated tool invocation.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use crate::dispatch::registry::ToolRegistry;
use crate::lifecycle::reload::ReloadCoordinator;
use crate::observability::spans;
use crate::observability::stats::StatsCollector;
use crate::safety::{OperationBlocked, SafetyGate};

/// What a caller gets back for one tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolCallResult {
    Success { output: Value },
    Failed { error: String },
    Blocked(OperationBlocked),
    UnknownTool { name: String },
}

impl ToolCallResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolCallResult::Success { .. })
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, ToolCallResult::Blocked(_))
    }
}

/// Routes a named call through the safety gate to its handler.
pub struct ToolDispatcher {
    registry: ToolRegistry,
    gate: Arc<SafetyGate>,
    stats: Arc<StatsCollector>,
    config: Arc<ReloadCoordinator>,
}

impl ToolDispatcher {
    pub fn new(
        registry: ToolRegistry,
        gate: Arc<SafetyGate>,
        stats: Arc<StatsCollector>,
        config: Arc<ReloadCoordinator>,
    ) -> Self {
        Self {
            registry,
            gate,
            stats,
            config,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Invoke `name` with `args` if the current safety mode permits it.
    ///
    /// The gate is consulted once, before the handler future is created.
    pub async fn call(&self, name: &str, args: Value) -> ToolCallResult {
        let Some(handler) = self.registry.get(name) else {
            tracing::debug!(tool = %name, "Unknown tool requested");
            return ToolCallResult::UnknownTool { name: name.to_string() };
        };

        if let Err(blocked) = self.gate.check(name) {
            self.stats.record_blocked(name, blocked.blocked_by_mode);
            return ToolCallResult::Blocked(blocked);
        }

        let span = spans::tool_call_span(&self.config.current().metrics, name);
        let started = Instant::now();
        let outcome = handler(args).instrument(span).await;
        let elapsed = started.elapsed();

        self.stats.record_call(name, outcome.is_ok(), elapsed);

        match outcome {
            Ok(output) => ToolCallResult::Success { output },
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Tool call failed");
                ToolCallResult::Failed { error: e.to_string() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectiveConfig;
    use crate::dispatch::registry::ToolError;
    use crate::safety::SafetyMode;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn dispatcher(mode: SafetyMode, registry: ToolRegistry) -> (ToolDispatcher, Arc<StatsCollector>) {
        let stats = Arc::new(StatsCollector::new());
        let coordinator = Arc::new(ReloadCoordinator::new(
            Box::new(crate::config::ConfigLoader::new(crate::config::ConfigPaths::in_dir(
                std::path::Path::new("/nonexistent/kube-mcp"),
            ))),
            EffectiveConfig::default(),
        ));
        let gate = Arc::new(SafetyGate::new(mode));
        (ToolDispatcher::new(registry, gate, stats.clone(), coordinator), stats)
    }

    fn flagging_registry(ran: Arc<AtomicBool>) -> ToolRegistry {
        let scale_ran = ran.clone();
        ToolRegistry::new()
            .register("delete_pod", move |_| {
                let ran = ran.clone();
                async move {
                    ran.store(true, Ordering::SeqCst);
                    Ok(json!({ "deleted": true }))
                }
            })
            .register("scale_deployment", move |args| {
                let ran = scale_ran.clone();
                async move {
                    ran.store(true, Ordering::SeqCst);
                    Ok(json!({ "replicas": args["replicas"] }))
                }
            })
            .register("get_pods", |_| async { Ok(json!([])) })
            .register("describe_pod", |_| async {
                Err(ToolError::InvalidArguments("name is required".into()))
            })
    }

    #[tokio::test]
    async fn test_read_only_never_runs_blocked_handler() {
        let ran = Arc::new(AtomicBool::new(false));
        let (dispatcher, stats) = dispatcher(SafetyMode::ReadOnly, flagging_registry(ran.clone()));

        let result = dispatcher.call("delete_pod", json!({ "name": "web-0" })).await;
        match result {
            ToolCallResult::Blocked(blocked) => {
                assert_eq!(blocked.operation_name, "delete_pod");
                assert_eq!(blocked.blocked_by_mode, SafetyMode::ReadOnly);
                assert!(blocked.reason.contains("read-only"));
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(stats.snapshot().blocked_calls, 1);
        assert_eq!(stats.snapshot().total_calls, 0);
    }

    #[tokio::test]
    async fn test_disable_destructive_allows_plain_writes() {
        let ran = Arc::new(AtomicBool::new(false));
        let (dispatcher, _) = dispatcher(SafetyMode::DisableDestructive, flagging_registry(ran.clone()));

        let scaled = dispatcher.call("scale_deployment", json!({ "replicas": 3 })).await;
        assert_eq!(scaled, ToolCallResult::Success { output: json!({ "replicas": 3 }) });
        assert!(ran.load(Ordering::SeqCst));

        ran.store(false, Ordering::SeqCst);
        assert!(dispatcher.call("delete_pod", Value::Null).await.is_blocked());
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failures_and_unknown_tools() {
        let (dispatcher, stats) = dispatcher(SafetyMode::Normal, flagging_registry(Arc::default()));

        assert!(dispatcher.call("get_pods", Value::Null).await.is_success());
        assert_eq!(
            dispatcher.call("describe_pod", Value::Null).await,
            ToolCallResult::Failed { error: "invalid arguments: name is required".into() }
        );
        assert_eq!(
            dispatcher.call("exec_pod", Value::Null).await,
            ToolCallResult::UnknownTool { name: "exec_pod".into() }
        );

        let snap = stats.snapshot();
        assert_eq!((snap.total_calls, snap.failed_calls), (2, 1));
        assert!(!snap.tools.contains_key("exec_pod"));
    }

    #[test]
    fn test_blocked_result_serializes_with_status_tag() {
        let gate = SafetyGate::new(SafetyMode::ReadOnly);
        let blocked = gate.check("delete_pod").unwrap_err();
        let value = serde_json::to_value(ToolCallResult::Blocked(blocked)).unwrap();
        assert_eq!(value["status"], "blocked");
        assert_eq!(value["operationName"], "delete_pod");
        assert_eq!(value["blockedByMode"], "read-only");
    }
}
