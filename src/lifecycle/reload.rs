//! Reload coordination.
//!
//! # Responsibilities
//! - Hold the current `EffectiveConfig` snapshot
//! - Re-run the loader on demand and swap the snapshot atomically
//! - Fan the new snapshot out to subscribers
//!
//! # Design Decisions
//! - All-or-nothing: a failed load leaves the previous snapshot current and
//!   no subscriber is called
//! - A failing or panicking subscriber is logged; the swap stands and the
//!   remaining subscribers still run
//! - Reloads are serialized, readers never wait on them

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::config::{ConfigError, ConfigLoader, EffectiveConfig};
use crate::observability::metrics;

/// Error a subscriber may return.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

type Callback = Arc<dyn Fn(&EffectiveConfig) -> Result<(), SubscriberError> + Send + Sync>;

/// Anything that can produce a fresh configuration snapshot.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<EffectiveConfig, ConfigError>;
}

impl ConfigSource for ConfigLoader {
    fn load(&self) -> Result<EffectiveConfig, ConfigError> {
        ConfigLoader::load(self)
    }
}

/// Handle returned by [`ReloadCoordinator::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("configuration reload failed: {0}")]
    Load(#[from] ConfigError),
}

/// Counters shown on the admin status page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadStats {
    pub succeeded: u64,
    pub failed: u64,
}

/// Owns the live configuration snapshot and its subscribers.
pub struct ReloadCoordinator {
    source: Box<dyn ConfigSource>,
    current: ArcSwap<EffectiveConfig>,
    subscribers: RwLock<Vec<(SubscriptionId, Callback)>>,
    next_id: AtomicU64,
    reload_lock: Mutex<()>,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl ReloadCoordinator {
    /// Start from an already loaded snapshot.
    pub fn new(source: Box<dyn ConfigSource>, initial: EffectiveConfig) -> Self {
        Self {
            source,
            current: ArcSwap::from_pointee(initial),
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            reload_lock: Mutex::new(()),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Perform the initial load from `source`.
    pub fn from_source(source: Box<dyn ConfigSource>) -> Result<Self, ConfigError> {
        let initial = source.load()?;
        Ok(Self::new(source, initial))
    }

    /// The snapshot in effect right now.
    pub fn current(&self) -> Arc<EffectiveConfig> {
        self.current.load_full()
    }

    pub fn register<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&EffectiveConfig) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Returns whether `id` was registered. Unknown ids are a no-op.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn stats(&self) -> ReloadStats {
        ReloadStats {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Re-read every configuration source and publish the result.
    ///
    /// Blocks on file I/O; call it from a blocking context in async code.
    pub fn reload(&self) -> Result<Arc<EffectiveConfig>, ReloadError> {
        let _serialized = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.current.load_full();

        let next = match self.source.load() {
            Ok(config) => Arc::new(config),
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                metrics::record_reload(false);
                tracing::error!(error = %e, "Config reload failed, keeping previous configuration");
                return Err(e.into());
            }
        };

        self.current.store(next.clone());
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        metrics::record_reload(true);
        tracing::info!(changed = *previous != *next, "Configuration reloaded");

        self.notify(&next);
        Ok(next)
    }

    fn notify(&self, config: &EffectiveConfig) {
        // Snapshot the list so callbacks may (un)register without deadlocking.
        let subscribers: Vec<(SubscriptionId, Callback)> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (id, callback) in subscribers {
            match catch_unwind(AssertUnwindSafe(|| callback(config))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(subscriber = ?id, error = %e, "Reload subscriber failed");
                }
                Err(_) => {
                    tracing::error!(subscriber = ?id, "Reload subscriber panicked");
                }
            }
        }
    }
}
