//! Clock abstraction and the spin-until-instant pacing primitive.
//!
//! Pacing never sleeps: the sender busy-waits on the clock until each
//! probe's absolute target instant so the scheduler cannot add the very
//! jitter being measured. The trait exists so tests can substitute a
//! manual clock instead of real-time spinning.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// Source of monotonic nanosecond timestamps.
pub trait Clock: Send + Sync {
    fn now_nanos(&self) -> i64;
}

/// Real clock: nanoseconds elapsed since the clock was created.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_nanos(&self) -> i64 {
        self.origin.elapsed().as_nanos() as i64
    }
}

/// Manual clock for tests: set or advance explicitly, with an optional
/// per-read auto-step so spin loops terminate without real time passing.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
    step: i64,
}

impl ManualClock {
    pub fn new(start_nanos: i64) -> Self {
        Self {
            now: AtomicI64::new(start_nanos),
            step: 0,
        }
    }

    /// Advance by `step` nanoseconds on every `now_nanos` call.
    pub fn with_step(start_nanos: i64, step: i64) -> Self {
        Self {
            now: AtomicI64::new(start_nanos),
            step,
        }
    }

    pub fn set(&self, nanos: i64) {
        self.now.store(nanos, Ordering::SeqCst);
    }

    pub fn advance(&self, nanos: i64) {
        self.now.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> i64 {
        self.now.fetch_add(self.step, Ordering::SeqCst)
    }
}

/// Busy-wait until the clock reaches `deadline_nanos`. No sleeping.
pub fn spin_until(clock: &dyn Clock, deadline_nanos: i64) {
    while clock.now_nanos() < deadline_nanos {
        std::hint::spin_loop();
    }
}
