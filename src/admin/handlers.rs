use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::config::EffectiveConfig;
use crate::lifecycle::reload::ReloadStats;
use crate::lifecycle::ServerContext;
use crate::observability::StatsSnapshot;
use crate::safety::{ModeInfo, SafetyMode};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub safety_mode: SafetyMode,
    pub transport: String,
    pub reload_signal: &'static str,
    pub reloads: ReloadStats,
    pub uptime_secs: u64,
    pub tools: Vec<String>,
}

#[derive(Serialize)]
pub struct SafetyStatus {
    #[serde(flatten)]
    pub info: ModeInfo,
    /// Mode pinned on the command line, if any.
    pub cli_override: Option<SafetyMode>,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub operation: String,
    pub allowed: bool,
    pub reason: String,
}

#[derive(Serialize)]
pub struct ReloadOutcome {
    pub reloaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_mode: Option<SafetyMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn get_status(State(ctx): State<Arc<ServerContext>>) -> Json<SystemStatus> {
    let config = ctx.config();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        safety_mode: ctx.gate.mode(),
        transport: config.server.transport.clone(),
        reload_signal: ctx.reload_signal().describe(),
        reloads: ctx.reload.stats(),
        uptime_secs: ctx.uptime().as_secs(),
        tools: ctx.tools.registry().names().into_iter().map(String::from).collect(),
    })
}

pub async fn get_safety(State(ctx): State<Arc<ServerContext>>) -> Json<SafetyStatus> {
    Json(SafetyStatus {
        info: ctx.gate.mode_info(),
        cli_override: ctx.cli_mode(),
    })
}

pub async fn check_tool(
    State(ctx): State<Arc<ServerContext>>,
    Path(tool): Path<String>,
) -> Json<CheckResult> {
    let decision = ctx.gate.is_operation_allowed(&tool);
    Json(CheckResult {
        operation: tool,
        allowed: decision.allowed,
        reason: decision.reason,
    })
}

pub async fn get_stats(State(ctx): State<Arc<ServerContext>>) -> Json<StatsSnapshot> {
    Json(ctx.stats.snapshot())
}

/// The effective config with secrets masked.
pub async fn get_config(State(ctx): State<Arc<ServerContext>>) -> Json<EffectiveConfig> {
    Json(ctx.config().redacted())
}

pub async fn trigger_reload(
    State(ctx): State<Arc<ServerContext>>,
) -> (StatusCode, Json<ReloadOutcome>) {
    let coordinator = ctx.reload.clone();
    let result = tokio::task::spawn_blocking(move || coordinator.reload()).await;

    let failure = |error: String| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ReloadOutcome {
                reloaded: false,
                safety_mode: None,
                error: Some(error),
            }),
        )
    };

    match result {
        Ok(Ok(_)) => {
            tracing::info!("Reload triggered through admin API");
            (
                StatusCode::OK,
                Json(ReloadOutcome {
                    reloaded: true,
                    safety_mode: Some(ctx.gate.mode()),
                    error: None,
                }),
            )
        }
        Ok(Err(e)) => failure(e.to_string()),
        Err(e) => failure(format!("reload task failed: {e}")),
    }
}
