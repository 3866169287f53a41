//! Wall-clock sources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Timelike;

/// Millisecond wall clock shared by every window on the host.
///
/// Liveness stamps are compared across processes, so this must be wall
/// time, not a process-local monotonic clock.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Hand-driven clock for tests and deterministic demos.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Seconds since local midnight, so every window animates from the same
/// time base regardless of when it started.
pub fn seconds_since_midnight() -> f64 {
    let now = chrono::Local::now();
    f64::from(now.num_seconds_from_midnight())
        + f64::from(now.nanosecond() % 1_000_000_000) / 1_000_000_000.0
}
