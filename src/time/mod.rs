//! Time source used by the batch runner
//!
//! All time based decisions (throttling, per query timeouts) go through the
//! [`Clock`] trait so they can be driven deterministically in tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Supplies the current time and a delay primitive
#[async_trait]
pub trait Clock: Send + Sync {
    /// Milliseconds since the unix epoch
    fn now_millis(&self) -> i64;

    /// Pause the calling task for `millis` milliseconds
    async fn sleep(&self, millis: u64);
}

/// Wall clock backed by chrono and tokio timers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    async fn sleep(&self, millis: u64) {
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

/// Manually driven clock
///
/// Time only moves when [`ManualClock::advance`] is called or when something
/// sleeps on it: a sleep advances the clock by the requested amount and
/// returns immediately. An optional per-read step makes every call to
/// `now_millis` move time forward, which is handy to simulate slow pages.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
    step: AtomicI64,
    slept: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `start` milliseconds
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
            step: AtomicI64::new(0),
            slept: AtomicU64::new(0),
        }
    }

    /// Advance the clock by `millis`
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Move time forward by `millis` after every `now_millis` read
    pub fn with_step(self, millis: i64) -> Self {
        self.step.store(millis, Ordering::SeqCst);
        self
    }

    /// Total milliseconds requested through `sleep`
    pub fn total_slept(&self) -> u64 {
        self.slept.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        let step = self.step.load(Ordering::SeqCst);
        self.now.fetch_add(step, Ordering::SeqCst)
    }

    async fn sleep(&self, millis: u64) {
        self.slept.fetch_add(millis, Ordering::SeqCst);
        self.advance(millis as i64);
    }
}
