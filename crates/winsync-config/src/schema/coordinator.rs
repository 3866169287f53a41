//! Coordinator timing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Heartbeat, staleness, and polling settings for the window coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// How often a window rewrites its own record even when its shape is
    /// unchanged, in milliseconds (valid range: 100-60000).
    pub heartbeat_interval_ms: u64,
    /// Number of missed heartbeats after which a foreign record is pruned.
    /// `0` disables pruning (valid range: 0-100).
    pub stale_after_missed: u32,
    /// Fallback reconcile interval for missed or coalesced change
    /// notifications, in milliseconds (valid range: 16-10000).
    pub poll_interval_ms: u64,
    /// Attempts at generating a window id that is not already registered
    /// (valid range: 1-64).
    pub id_retry_limit: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 1000,
            stale_after_missed: 5,
            poll_interval_ms: 250,
            id_retry_limit: 8,
        }
    }
}

impl CoordinatorConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Age after which a foreign record counts as abandoned, or `None`
    /// when pruning is disabled.
    pub fn stale_after(&self) -> Option<Duration> {
        if self.stale_after_missed == 0 {
            return None;
        }
        Some(Duration::from_millis(
            self.heartbeat_interval_ms
                .saturating_mul(u64::from(self.stale_after_missed)),
        ))
    }
}
