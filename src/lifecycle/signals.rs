//! OS signal handling.
//!
//! # Responsibilities
//! - SIGHUP triggers a config reload, not shutdown
//! - SIGTERM/SIGINT resolve `wait_for_shutdown_signal`
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Platforms without SIGHUP get `ReloadSignal::NotSupported`

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::lifecycle::reload::ReloadCoordinator;

/// Whether the OS reload trigger is wired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReloadSignal {
    Installed,
    NotSupported,
}

impl ReloadSignal {
    pub fn describe(self) -> &'static str {
        match self {
            ReloadSignal::Installed => "SIGHUP reload enabled",
            ReloadSignal::NotSupported => "not set up: reload signal unsupported on this platform",
        }
    }
}

/// Spawn a task that reloads `coordinator` on every SIGHUP until shutdown.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_reload_listener(
    coordinator: Arc<ReloadCoordinator>,
    shutdown: broadcast::Receiver<()>,
) -> ReloadSignal {
    let status = install(coordinator, shutdown);
    match status {
        ReloadSignal::Installed => tracing::info!("SIGHUP reload handler installed"),
        ReloadSignal::NotSupported => tracing::warn!("Reload signal handler not set up"),
    }
    status
}

#[cfg(unix)]
fn install(coordinator: Arc<ReloadCoordinator>, mut shutdown: broadcast::Receiver<()>) -> ReloadSignal {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to register SIGHUP handler");
            return ReloadSignal::NotSupported;
        }
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("SIGHUP received, reloading configuration");
                    reload_blocking(coordinator.clone()).await;
                }
                _ = shutdown.recv() => break,
            }
        }
        tracing::debug!("Reload signal listener stopped");
    });

    ReloadSignal::Installed
}

#[cfg(not(unix))]
fn install(_coordinator: Arc<ReloadCoordinator>, _shutdown: broadcast::Receiver<()>) -> ReloadSignal {
    ReloadSignal::NotSupported
}

/// Run a reload on the blocking pool, logging the outcome.
pub async fn reload_blocking(coordinator: Arc<ReloadCoordinator>) {
    match tokio::task::spawn_blocking(move || coordinator.reload()).await {
        Ok(Ok(config)) => {
            tracing::info!(safety_mode = %config.safety.mode, "Reload complete");
        }
        // Already logged by the coordinator.
        Ok(Err(_)) => {}
        Err(e) => tracing::error!(error = %e, "Reload task failed"),
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl+C received"),
        _ = terminate => tracing::info!("SIGTERM received"),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::{ConfigError, EffectiveConfig};
    use crate::lifecycle::reload::ConfigSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    struct CountingSource(Arc<AtomicUsize>);

    impl ConfigSource for CountingSource {
        fn load(&self) -> Result<EffectiveConfig, ConfigError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(EffectiveConfig::default())
        }
    }

    #[tokio::test]
    async fn test_reload_blocking_runs_loader() {
        let loads = Arc::new(AtomicUsize::new(0));
        let coordinator = Arc::new(ReloadCoordinator::new(
            Box::new(CountingSource(loads.clone())),
            EffectiveConfig::default(),
        ));

        reload_blocking(coordinator.clone()).await;
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.stats().succeeded, 1);
    }

    #[tokio::test]
    async fn test_listener_installs_on_unix() {
        let coordinator = Arc::new(ReloadCoordinator::new(
            Box::new(CountingSource(Arc::new(AtomicUsize::new(0)))),
            EffectiveConfig::default(),
        ));
        let (tx, rx) = broadcast::channel(1);

        assert_eq!(spawn_reload_listener(coordinator, rx), ReloadSignal::Installed);
        let _ = tx.send(());
    }

    #[tokio::test]
    async fn test_sighup_triggers_reload() {
        let loads = Arc::new(AtomicUsize::new(0));
        let coordinator = Arc::new(ReloadCoordinator::new(
            Box::new(CountingSource(loads.clone())),
            EffectiveConfig::default(),
        ));
        let (tx, rx) = broadcast::channel(1);
        assert_eq!(spawn_reload_listener(coordinator.clone(), rx), ReloadSignal::Installed);

        let status = std::process::Command::new("kill")
            .args(["-HUP", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let deadline = Instant::now() + Duration::from_secs(10);
        while coordinator.stats().succeeded == 0 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(coordinator.stats().succeeded >= 1);
        assert!(loads.load(Ordering::SeqCst) >= 1);
        let _ = tx.send(());
    }
}
