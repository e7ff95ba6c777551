//! Time source abstraction
//!
//! The due rule and the activity classifier both reason about wall-clock
//! timestamps in epoch milliseconds. Production code uses `SystemClock`;
//! tests and simulations drive a `ManualClock` forward explicitly so tier
//! transitions and redue windows are deterministic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Epoch-millisecond time source
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the unix epoch
    fn now_ms(&self) -> u64;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Manually advanced clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    /// Create a clock pinned at the given epoch-millisecond timestamp
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    /// Create a clock pinned at the current wall-clock time
    pub fn at_wall_clock() -> Self {
        Self::starting_at(SystemClock.now_ms())
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

// ============================================================================
// TESTS
// ============================================================================
