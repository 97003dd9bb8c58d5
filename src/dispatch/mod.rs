//! Tool dispatch.
//!
//! # Data Flow
//! ```text
//! call("scale_deployment", args)
//!     → registry.rs (look up the handler by declared name)
//!     → SafetyGate::check (blocked → ToolCallResult::Blocked, handler untouched)
//!     → handler(args).await
//!     → StatsCollector::record_call (success or failure, with duration)
//!     → ToolCallResult
//! ```
//!
//! # Design Decisions
//! - The gate keys on the registered name, never on anything inside the handler
//! - Every outcome is a value; a blocked or failing tool never aborts the server

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{ToolCallResult, ToolDispatcher};
pub use registry::{ToolError, ToolFuture, ToolHandler, ToolRegistry};
