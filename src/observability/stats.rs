//! In-process tool call statistics.
//!
//! Fire-and-forget relative to the gate: recording takes a shard lock in a
//! `DashMap` plus a few atomic increments and can't fail.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

use crate::observability::metrics;
use crate::safety::SafetyMode;

#[derive(Debug, Default)]
struct ToolCounters {
    calls: AtomicU64,
    failures: AtomicU64,
    blocked: AtomicU64,
    total_micros: AtomicU64,
}

/// Per-tool figures in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolStats {
    pub calls: u64,
    pub failures: u64,
    pub blocked: u64,
    pub avg_duration_ms: f64,
}

/// Point-in-time copy of the collector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub blocked_calls: u64,
    /// Successful share of completed calls; 1.0 before any call.
    pub success_rate: f64,
    pub tools: BTreeMap<String, ToolStats>,
}

/// Aggregates tool call outcomes for the status endpoints.
#[derive(Debug)]
pub struct StatsCollector {
    tools: DashMap<String, ToolCounters>,
    calls: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    blocked: AtomicU64,
    started_at: Instant,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
            calls: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    fn with_tool(&self, tool: &str, f: impl FnOnce(&ToolCounters)) {
        if let Some(counters) = self.tools.get(tool) {
            f(counters.value());
            return;
        }
        f(self.tools.entry(tool.to_string()).or_default().value());
    }

    /// Record a completed call, successful or not.
    pub fn record_call(&self, tool: &str, success: bool, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        self.calls.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }

        self.with_tool(tool, |c| {
            c.calls.fetch_add(1, Ordering::Relaxed);
            c.total_micros.fetch_add(micros, Ordering::Relaxed);
            if !success {
                c.failures.fetch_add(1, Ordering::Relaxed);
            }
        });

        metrics::record_tool_call(tool, success, duration);
    }

    /// Record a call rejected by the gate. Blocked calls are not counted as calls.
    pub fn record_blocked(&self, tool: &str, mode: SafetyMode) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
        self.with_tool(tool, |c| {
            c.blocked.fetch_add(1, Ordering::Relaxed);
        });
        metrics::record_blocked(tool, mode);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let total_calls = self.calls.load(Ordering::Relaxed);
        let successful_calls = self.successes.load(Ordering::Relaxed);

        let tools = self
            .tools
            .iter()
            .map(|entry| {
                let c = entry.value();
                let calls = c.calls.load(Ordering::Relaxed);
                let total_ms = c.total_micros.load(Ordering::Relaxed) as f64 / 1000.0;
                let stats = ToolStats {
                    calls,
                    failures: c.failures.load(Ordering::Relaxed),
                    blocked: c.blocked.load(Ordering::Relaxed),
                    avg_duration_ms: if calls == 0 { 0.0 } else { total_ms / calls as f64 },
                };
                (entry.key().clone(), stats)
            })
            .collect();

        StatsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs(),
            total_calls,
            successful_calls,
            failed_calls: self.failures.load(Ordering::Relaxed),
            blocked_calls: self.blocked.load(Ordering::Relaxed),
            success_rate: if total_calls == 0 {
                1.0
            } else {
                successful_calls as f64 / total_calls as f64
            },
            tools,
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
