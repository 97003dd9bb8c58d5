//! Startup orchestration.
//!
//! `ServerContext` is the composition root: it owns the shared services that
//! used to be process globals and hands them out by `Arc`.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use crate::config::{ConfigError, EffectiveConfig};
use crate::dispatch::{ToolDispatcher, ToolRegistry};
use crate::lifecycle::reload::{ConfigSource, ReloadCoordinator};
use crate::lifecycle::signals::ReloadSignal;
use crate::observability::stats::StatsCollector;
use crate::safety::{safety_mode_subscriber, SafetyGate, SafetyMode};

/// Shared services for one server process.
pub struct ServerContext {
    pub gate: Arc<SafetyGate>,
    pub stats: Arc<StatsCollector>,
    pub reload: Arc<ReloadCoordinator>,
    pub tools: Arc<ToolDispatcher>,
    cli_mode: Option<SafetyMode>,
    reload_signal: OnceLock<ReloadSignal>,
    started_at: Instant,
}

impl ServerContext {
    /// Load the initial config and wire every service together.
    ///
    /// `cli_mode` is the safety mode given on the command line; it wins over the
    /// config file now and on every later reload.
    pub fn bootstrap<S>(source: S, cli_mode: Option<SafetyMode>, registry: ToolRegistry) -> Result<Arc<Self>, ConfigError>
    where
        S: ConfigSource + 'static,
    {
        let coordinator = Arc::new(ReloadCoordinator::from_source(Box::new(source))?);
        let config = coordinator.current();

        let gate = Arc::new(SafetyGate::new(cli_mode.unwrap_or(config.safety.mode)));
        coordinator.register(safety_mode_subscriber(gate.clone(), cli_mode));

        let stats = Arc::new(StatsCollector::new());
        let tools = Arc::new(ToolDispatcher::new(
            registry,
            gate.clone(),
            stats.clone(),
            coordinator.clone(),
        ));

        tracing::info!(
            safety_mode = %gate.mode(),
            cli_override = cli_mode.is_some(),
            transport = %config.server.transport,
            tools = tools.registry().len(),
            "Server context ready"
        );

        Ok(Arc::new(Self {
            gate,
            stats,
            reload: coordinator,
            tools,
            cli_mode,
            reload_signal: OnceLock::new(),
            started_at: Instant::now(),
        }))
    }

    pub fn config(&self) -> Arc<EffectiveConfig> {
        self.reload.current()
    }

    pub fn cli_mode(&self) -> Option<SafetyMode> {
        self.cli_mode
    }

    /// Record how the reload trigger was set up. Only the first call sticks.
    pub fn set_reload_signal(&self, signal: ReloadSignal) {
        let _ = self.reload_signal.set(signal);
    }

    /// `NotSupported` until a listener was installed.
    pub fn reload_signal(&self) -> ReloadSignal {
        self.reload_signal.get().copied().unwrap_or(ReloadSignal::NotSupported)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct SwappableSource(Mutex<EffectiveConfig>);

    impl ConfigSource for Arc<SwappableSource> {
        fn load(&self) -> Result<EffectiveConfig, ConfigError> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    fn config_with_mode(mode: SafetyMode) -> EffectiveConfig {
        let mut config = EffectiveConfig::default();
        config.safety.mode = mode;
        config
    }

    #[test]
    fn test_mode_follows_config_on_reload() {
        let source = Arc::new(SwappableSource(Mutex::new(config_with_mode(SafetyMode::Normal))));
        let ctx = ServerContext::bootstrap(source.clone(), None, ToolRegistry::new()).unwrap();
        assert_eq!(ctx.gate.mode(), SafetyMode::Normal);

        *source.0.lock().unwrap() = config_with_mode(SafetyMode::DisableDestructive);
        ctx.reload.reload().unwrap();
        assert_eq!(ctx.gate.mode(), SafetyMode::DisableDestructive);
    }

    #[test]
    fn test_cli_mode_is_sticky_across_reloads() {
        let source = Arc::new(SwappableSource(Mutex::new(config_with_mode(SafetyMode::Normal))));
        let ctx = ServerContext::bootstrap(source.clone(), Some(SafetyMode::ReadOnly), ToolRegistry::new()).unwrap();
        assert_eq!(ctx.gate.mode(), SafetyMode::ReadOnly);

        *source.0.lock().unwrap() = config_with_mode(SafetyMode::Normal);
        ctx.reload.reload().unwrap();
        assert_eq!(ctx.gate.mode(), SafetyMode::ReadOnly);
        assert_eq!(ctx.config().safety.mode, SafetyMode::Normal);
    }

    #[test]
    fn test_reload_signal_defaults_to_not_supported() {
        let source = Arc::new(SwappableSource(Mutex::new(EffectiveConfig::default())));
        let ctx = ServerContext::bootstrap(source, None, ToolRegistry::new()).unwrap();
        assert_eq!(ctx.reload_signal(), ReloadSignal::NotSupported);

        ctx.set_reload_signal(ReloadSignal::Installed);
        assert_eq!(ctx.reload_signal(), ReloadSignal::Installed);
    }
}
