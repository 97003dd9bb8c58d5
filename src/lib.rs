//! Safety gate and configuration core for a Kubernetes MCP server.

pub mod admin;
pub mod config;
pub mod dispatch;
pub mod lifecycle;
pub mod observability;
pub mod safety;

pub use config::{ConfigLoader, EffectiveConfig};
pub use dispatch::{ToolCallResult, ToolDispatcher, ToolRegistry};
pub use lifecycle::{ReloadCoordinator, ServerContext, Shutdown};
pub use safety::{SafetyGate, SafetyMode};
