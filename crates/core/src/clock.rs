// SPDX-License-Identifier: MIT

//! Time source behind lifecycle stamps and surveillance deadlines.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the unix epoch.
///
/// Everything the orchestrator records about an instance — creation,
/// start, stop, last heartbeat — is an epoch-millisecond stamp obtained
/// here, and the readiness scanner and health probe measure their
/// deadlines by comparing stamps. Keeping the contract to one method
/// lets tests age heartbeats by ticking a counter.
pub trait Clock: Clone + Send + Sync + 'static {
    fn epoch_ms(&self) -> u64;

    /// Milliseconds elapsed since an earlier stamp; zero for stamps
    /// that lie in the future.
    fn since_ms(&self, earlier_ms: u64) -> u64 {
        self.epoch_ms().saturating_sub(earlier_ms)
    }
}

/// Wall clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Stable stamp fake clocks boot at; mid-2025 wall time.
const FAKE_BOOT_MS: u64 = 1_750_000_000_000;

/// Manually driven clock for heartbeat-expiry and deadline tests.
///
/// Time only moves when advanced, so a probe pass observes exactly the
/// heartbeat age the test arranged.
#[derive(Clone)]
pub struct FakeClock {
    epoch_ms: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { epoch_ms: Arc::new(AtomicU64::new(FAKE_BOOT_MS)) }
    }

    /// Move time forward; recorded stamps age accordingly.
    pub fn advance(&self, by: Duration) {
        self.epoch_ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_epoch_ms(&self, ms: u64) {
        self.epoch_ms.store(ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> u64 {
        self.epoch_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
