//! Duration-gated condition.

use super::clock::{system_clock, Clock};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Condition that becomes true once `duration` has elapsed since it was armed.
///
/// A timer that was never armed is false. Arming an armed timer does nothing;
/// call [`reset`](Self::reset) to allow arming it again.
///
/// # Example
///
/// ```rust
/// use tickstate::timing::{FakeClock, TimedCondition};
/// use std::time::Duration;
///
/// let clock = FakeClock::new();
/// let mut timer = TimedCondition::with_clock(Duration::from_secs(2), clock.shared());
///
/// assert!(!timer.evaluate());
/// timer.arm();
/// clock.advance(Duration::from_secs(2));
/// assert!(timer.evaluate());
/// ```
pub struct TimedCondition {
    duration: Duration,
    armed_at: Option<Instant>,
    clock: Arc<dyn Clock>,
}

impl TimedCondition {
    /// Timer on the system clock.
    pub fn new(duration: Duration) -> Self {
        Self::with_clock(duration, system_clock())
    }

    pub fn with_clock(duration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            duration,
            armed_at: None,
            clock,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start timing from now. No-op when already armed.
    pub fn arm(&mut self) {
        if self.armed_at.is_none() {
            self.armed_at = Some(self.clock.now());
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    pub fn reset(&mut self) {
        self.armed_at = None;
    }

    /// Time since arming, or `None` when not armed.
    pub fn elapsed(&self) -> Option<Duration> {
        self.armed_at
            .map(|armed_at| self.clock.now().saturating_duration_since(armed_at))
    }

    /// True iff armed and at least `duration` has elapsed.
    pub fn evaluate(&self) -> bool {
        self.elapsed()
            .is_some_and(|elapsed| elapsed >= self.duration)
    }
}

impl fmt::Debug for TimedCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedCondition")
            .field("duration", &self.duration)
            .field("armed", &self.is_armed())
            .finish()
    }
}
