//! Time sources for the phase loop
//!
//! The loop only asks a [`Clock`] for the current instant and to sleep, so
//! tests can drive it with a [`ManualClock`] instead of waiting in real time.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Real-time pause a manual clock takes in `sleep` while waiting to be advanced
const MANUAL_SLEEP_BACKOFF: Duration = Duration::from_micros(200);

/// Monotonic time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by `Instant::now` and `thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// A clock that only moves when told to
///
/// Clones share the same instant, so a test can hold one handle while the
/// phase loop holds another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
    start: Instant,
    advance_on_sleep: bool,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Clock that moves only through [`ManualClock::advance`]
    pub fn new() -> Self {
        let start = Instant::now();
        Self {
            now: Arc::new(Mutex::new(start)),
            start,
            advance_on_sleep: false,
        }
    }

    /// Clock where every `sleep(d)` moves time forward by `d` without
    /// waiting, so simulated time runs as fast as the sleeper loops
    pub fn auto_advancing() -> Self {
        Self {
            advance_on_sleep: true,
            ..Self::new()
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += duration;
    }

    /// Simulated time since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.now().duration_since(self.start)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sleep(&self, duration: Duration) {
        if self.advance_on_sleep {
            self.advance(duration);
            thread::yield_now();
        } else {
            thread::sleep(MANUAL_SLEEP_BACKOFF);
        }
    }
}
