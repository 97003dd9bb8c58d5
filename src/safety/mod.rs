//! Safety mode gate.
//!
//! # Data Flow
//! ```text
//! tool call "delete_pod"
//!     → gate.rs (read current mode, one atomic load)
//!     → classification.rs (is the name a write? destructive?)
//!     → GateDecision { allowed, reason }
//!     → blocked: OperationBlocked returned, tool body never runs
//!
//! On config reload:
//!     reload subscriber derives mode (CLI override > file > default)
//!     → gate.set_mode() (atomic store)
//!     → only calls checked afterwards observe the new mode
//! ```
//!
//! # Design Decisions
//! - Classification is opt-in: unknown names are always allowed
//! - ReadOnly blocks writes and destructive operations, DisableDestructive only the latter
//! - Enforcement and reporting share one rule, so `ModeInfo` cannot drift

pub mod classification;
pub mod gate;
pub mod mode;

pub use classification::{ClassificationError, OperationClassification};
pub use gate::{safety_mode_subscriber, GateDecision, ModeInfo, OperationBlocked, SafetyGate};
pub use mode::{ParseSafetyModeError, SafetyMode};
