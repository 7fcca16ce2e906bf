//! Clock abstraction for testable time handling.
//!
//! Timers only ever compare instants from the same clock, so any monotonic
//! source works. Production code uses [`SystemClock`]; tests and simulations
//! drive a [`FakeClock`] by hand.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A monotonic clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Real monotonic clock backed by [`Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Shared handle to the system clock.
pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

/// Fake clock with controllable time.
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and give another to the state machine.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }

    /// Advance the clock by fractional seconds
    pub fn advance_secs(&self, seconds: f64) {
        self.advance(Duration::from_secs_f64(seconds));
    }

    /// Shared handle usable wherever the engine expects a clock.
    pub fn shared(&self) -> Arc<dyn Clock> {
        Arc::new(self.clone())
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_only_moves_when_advanced() {
        let clock = FakeClock::new();
        let start = clock.now();

        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }

    #[test]
    fn fake_clock_clones_share_time() {
        let clock = FakeClock::new();
        let handle = clock.shared();
        let start = handle.now();

        clock.advance_secs(1.5);

        assert_eq!(handle.now() - start, Duration::from_millis(1500));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = system_clock();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
