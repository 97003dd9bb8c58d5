//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mcp_tool_calls_total` (counter): completed calls by tool, outcome
//! - `mcp_tool_call_duration_seconds` (histogram): tool body latency
//! - `mcp_tool_calls_blocked_total` (counter): gate rejections by tool, mode
//! - `mcp_config_reloads_total` (counter): reloads by result
//! - `mcp_safety_mode` (gauge): 0=normal, 1=read-only, 2=disable-destructive

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::config::MetricsConfig;
use crate::safety::SafetyMode;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint listening");
    Ok(())
}

/// Start the exporter described by `config`. Failures are logged, not fatal.
///
/// Install it before building the safety gate so the startup mode is recorded.
pub fn start_exporter(config: &MetricsConfig) {
    match config.prometheus_address.parse() {
        Ok(addr) => {
            if let Err(e) = init_metrics(addr) {
                tracing::error!(error = %e, "Failed to start metrics exporter");
            }
        }
        Err(_) => tracing::error!(
            prometheus_address = %config.prometheus_address,
            "Failed to parse metrics address"
        ),
    }
}

pub fn record_tool_call(tool: &str, success: bool, duration: Duration) {
    let outcome = if success { "success" } else { "error" };
    metrics::counter!("mcp_tool_calls_total", "tool" => tool.to_string(), "outcome" => outcome).increment(1);
    metrics::histogram!("mcp_tool_call_duration_seconds", "tool" => tool.to_string()).record(duration.as_secs_f64());
}

pub fn record_blocked(tool: &str, mode: SafetyMode) {
    metrics::counter!("mcp_tool_calls_blocked_total", "tool" => tool.to_string(), "mode" => mode.as_str()).increment(1);
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("mcp_config_reloads_total", "result" => result).increment(1);
}

pub fn record_safety_mode(mode: SafetyMode) {
    metrics::gauge!("mcp_safety_mode").set(f64::from(mode as u8));
}
