use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::traits::Clock;

/// Wall-clock time; sleeps block the calling thread.
#[derive(Clone, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Deterministic clock: `sleep` advances time instantly and is recorded.
#[derive(Debug, Default)]
pub struct ManualClock {
    inner: Mutex<ManualInner>,
}

#[derive(Debug, Default)]
struct ManualInner {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, ManualInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn advance(&self, d: Duration) {
        self.inner().now += d;
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner().sleeps.clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.inner().sleeps.iter().sum()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.inner().now
    }

    fn sleep(&self, d: Duration) {
        let mut inner = self.inner();
        inner.now += d;
        inner.sleeps.push(d);
    }
}
