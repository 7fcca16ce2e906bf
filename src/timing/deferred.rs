//! One-shot callbacks bound to a delay.

use super::clock::{system_clock, Clock};
use super::timed::TimedCondition;
use crate::core::{Action, BoxedAction};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Action that runs once, `duration` after it was armed.
///
/// After firing the callback stays done until [`reset`](Self::reset), which
/// clears both the armed and the done flag.
pub struct DeferredCallback {
    timer: TimedCondition,
    action: BoxedAction,
    done: bool,
}

impl DeferredCallback {
    /// Deferred callback on the system clock.
    pub fn new<A>(duration: Duration, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        Self::with_clock(duration, action, system_clock())
    }

    pub fn with_clock<A>(duration: Duration, action: A, clock: Arc<dyn Clock>) -> Self
    where
        A: Action + Send + 'static,
    {
        Self {
            timer: TimedCondition::with_clock(duration, clock),
            action: Box::new(action),
            done: false,
        }
    }

    pub fn duration(&self) -> Duration {
        self.timer.duration()
    }

    /// Start the delay. No-op when already armed.
    pub fn arm(&mut self) {
        self.timer.arm();
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn reset(&mut self) {
        self.timer.reset();
        self.done = false;
    }

    /// Per-tick check. Runs the action if the delay is over and it has not
    /// run yet in this arm cycle. Returns whether it ran.
    pub fn poll(&mut self) -> bool {
        if self.done || !self.timer.evaluate() {
            return false;
        }
        self.action.invoke();
        self.done = true;
        true
    }
}

impl fmt::Debug for DeferredCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredCallback")
            .field("duration", &self.duration())
            .field("armed", &self.is_armed())
            .field("done", &self.done)
            .finish()
    }
}
