//! Time sources and tick scheduling.
//!
//! The engine never calls a global clock or sleep directly. It reads the
//! time from a [`Clock`] and waits for work from a [`Ticker`], so tests can
//! drive whole sessions with [`ManualClock`] and a scripted ticker.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use seesaw_core::time_util::{duration_ms, now_ms};
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Wall-clock time plus the ability to wait.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;

    /// Suspend for `d`.
    async fn sleep(&self, d: Duration);
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        now_ms()
    }

    async fn sleep(&self, d: Duration) {
        tokio::time::sleep(d).await;
    }
}

/// A clock that only moves when told to. `sleep` advances it instantly.
///
/// Clones share the same time.
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

    pub fn advance(&self, d: Duration) {
        self.now.fetch_add(duration_ms(d), Ordering::SeqCst);
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

// ---------------------------------------------------------------------------
// Tickers
// ---------------------------------------------------------------------------

/// Produces tick events for the run loop.
#[async_trait]
pub trait Ticker: Send {
    /// Wait until the next tick is due.
    async fn tick(&mut self);
}

/// Fixed-period ticker on the tokio timer.
///
/// The first tick fires one period after construction. A tick that runs
/// long pushes the schedule back instead of bursting to catch up.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
