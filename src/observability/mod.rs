//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Tool calls and reloads produce:
//!     → stats.rs (in-process counters, served by the admin API)
//!     → metrics.rs (Prometheus counters, gauges, histograms)
//!     → spans.rs (sampled per-call spans)
//!     → logging.rs (structured log events)
//! ```
//!
//! # Design Decisions
//! - Recording never blocks or fails the gate decision
//! - Metric macros are no-ops until the exporter is installed
//! - Log output goes to stderr; stdout belongs to the stdio transport

pub mod logging;
pub mod metrics;
pub mod spans;
pub mod stats;

pub use stats::{StatsCollector, StatsSnapshot, ToolStats};
