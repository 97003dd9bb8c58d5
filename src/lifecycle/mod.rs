//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → build gate, stats, dispatcher → register reload subscribers
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!     SIGHUP → ReloadCoordinator::reload (blocking pool)
//!
//! Reload (reload.rs):
//!     loader → swap Arc<EffectiveConfig> → subscribers (safety mode, log level)
//! ```
//!
//! # Design Decisions
//! - Reload never interrupts in-flight tool calls; there is no draining
//! - Missing SIGHUP support is reported, never fatal
//! - CLI flags given at startup are re-applied on every reload

pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use reload::{ConfigSource, ReloadCoordinator, ReloadError, SubscriberError, SubscriptionId};
pub use shutdown::Shutdown;
pub use signals::ReloadSignal;
pub use startup::ServerContext;
