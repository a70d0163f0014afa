// =============================================================================
// Application State: shared by the REST handlers
// =============================================================================
//
// The signal engine itself is stateless; the only shared data is the runtime
// configuration and a few operational counters.
//
// Thread safety:
//   - Atomic counters for lock-free request tracking.
//   - parking_lot::RwLock around the runtime configuration.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::runtime_config::RuntimeConfig;
use crate::signals::SignalEngine;

/// Shared state handed to every handler via `Arc<AppState>`.
pub struct AppState {
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    pub engine: SignalEngine,

    /// Where config updates are persisted; `None` keeps them in memory only.
    pub config_path: Option<PathBuf>,

    /// Number of analysis requests served (bars actually processed).
    pub analyses_served: AtomicU64,

    /// Instant when the service was started. Used for uptime calculations.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            runtime_config: Arc::new(RwLock::new(config)),
            engine: SignalEngine::new(),
            config_path: None,
            analyses_served: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Persist runtime config updates to `path`.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Clone of the current configuration; the lock is released on return.
    pub fn config(&self) -> RuntimeConfig {
        self.runtime_config.read().clone()
    }

    /// Count one analysis and return the new total.
    pub fn record_analysis(&self) -> u64 {
        self.analyses_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn analyses_served(&self) -> u64 {
        self.analyses_served.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
