//! Per-call tracing spans.
//!
//! Spans are only created for the sampled fraction of calls, and only when
//! `metrics.tracing_enabled` is set.

use tracing::Span;

use crate::config::MetricsConfig;

pub fn should_sample(config: &MetricsConfig) -> bool {
    if !config.tracing_enabled || config.sample_rate <= 0.0 {
        return false;
    }
    config.sample_rate >= 1.0 || fastrand::f64() < config.sample_rate
}

/// A span for one tool call, or a disabled span when not sampled.
pub fn tool_call_span(config: &MetricsConfig, tool: &str) -> Span {
    if should_sample(config) {
        tracing::info_span!("tool_call", tool = %tool)
    } else {
        Span::none()
    }
}
