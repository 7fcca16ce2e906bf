//! Conditions, actions and the guards built from them.
//!
//! Conditions are zero-argument predicates re-evaluated every tick. Actions are
//! zero-argument callbacks the engine invokes synchronously. Both are opaque to
//! the engine: it only looks at the returned boolean or at the fact that the
//! call happened.

use crate::timing::{Clock, TimedCondition};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Predicate deciding whether something may happen on this tick.
///
/// Any `FnMut() -> bool` closure is a condition.
///
/// # Example
///
/// ```rust
/// use tickstate::core::Condition;
///
/// let mut ticks = 0;
/// let mut every_third = move || {
///     ticks += 1;
///     ticks % 3 == 0
/// };
///
/// assert!(!every_third.evaluate());
/// assert!(!every_third.evaluate());
/// assert!(every_third.evaluate());
/// ```
pub trait Condition {
    fn evaluate(&mut self) -> bool;
}

impl<F> Condition for F
where
    F: FnMut() -> bool,
{
    fn evaluate(&mut self) -> bool {
        self()
    }
}

/// Side-effecting callback run by the engine.
///
/// Any `FnMut()` closure is an action.
pub trait Action {
    fn invoke(&mut self);
}

impl<F> Action for F
where
    F: FnMut(),
{
    fn invoke(&mut self) {
        self()
    }
}

/// Owned, type-erased condition.
pub type BoxedCondition = Box<dyn Condition + Send>;

/// Owned, type-erased action.
pub type BoxedAction = Box<dyn Action + Send>;

/// Run every action of a list in order.
pub(crate) fn run_all(actions: &mut [BoxedAction]) {
    for action in actions.iter_mut() {
        action.invoke();
    }
}

/// Gate in front of a transition or a state's dwell time.
///
/// A guard is either a caller predicate or a [`TimedCondition`]. Timed guards
/// carry state: the engine arms them when the owning state is active and
/// resets them when the state is left.
pub enum Guard {
    /// Caller-supplied predicate.
    When(BoxedCondition),
    /// True once its duration has elapsed since arming.
    Elapsed(TimedCondition),
}

impl Guard {
    /// Guard from any predicate closure.
    pub fn when<C>(condition: C) -> Self
    where
        C: Condition + Send + 'static,
    {
        Guard::When(Box::new(condition))
    }

    /// Timed guard on the system clock.
    pub fn elapsed(duration: Duration) -> Self {
        Guard::Elapsed(TimedCondition::new(duration))
    }

    /// Timed guard on the given clock.
    pub fn elapsed_on(duration: Duration, clock: Arc<dyn Clock>) -> Self {
        Guard::Elapsed(TimedCondition::with_clock(duration, clock))
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, Guard::Elapsed(_))
    }

    /// Arm the timer if this is a timed guard that is not armed yet.
    pub fn arm(&mut self) {
        if let Guard::Elapsed(timer) = self {
            if !timer.is_armed() {
                timer.arm();
            }
        }
    }

    /// Disarm the timer of a timed guard. Predicates are untouched.
    pub fn reset(&mut self) {
        if let Guard::Elapsed(timer) = self {
            timer.reset();
        }
    }

    /// Evaluate the guard for this tick.
    pub fn check(&mut self) -> bool {
        match self {
            Guard::When(condition) => condition.evaluate(),
            Guard::Elapsed(timer) => timer.evaluate(),
        }
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::When(_) => f.write_str("Guard::When(..)"),
            Guard::Elapsed(timer) => f.debug_tuple("Guard::Elapsed").field(timer).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::FakeClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn predicate_guard_evaluates_closure() {
        let mut guard = Guard::when(|| true);
        assert!(guard.check());

        let mut guard = Guard::when(|| false);
        assert!(!guard.check());
    }

    #[test]
    fn predicate_guard_is_reevaluated_every_check() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut guard = Guard::when(move || counter.fetch_add(1, Ordering::SeqCst) >= 1);

        assert!(!guard.check());
        assert!(guard.check());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn timed_guard_needs_arming() {
        let clock = FakeClock::new();
        let mut guard = Guard::elapsed_on(Duration::from_secs(1), Arc::new(clock.clone()));

        clock.advance(Duration::from_secs(5));
        assert!(!guard.check());

        guard.arm();
        assert!(!guard.check());

        clock.advance(Duration::from_secs(1));
        assert!(guard.check());
    }

    #[test]
    fn arm_does_not_restart_a_running_timer() {
        let clock = FakeClock::new();
        let mut guard = Guard::elapsed_on(Duration::from_secs(2), Arc::new(clock.clone()));

        guard.arm();
        clock.advance(Duration::from_secs(1));
        guard.arm();
        clock.advance(Duration::from_secs(1));

        assert!(guard.check());
    }

    #[test]
    fn reset_disarms_timed_guard() {
        let clock = FakeClock::new();
        let mut guard = Guard::elapsed_on(Duration::ZERO, Arc::new(clock.clone()));

        guard.arm();
        assert!(guard.check());

        guard.reset();
        assert!(!guard.check());
    }

    #[test]
    fn actions_run_in_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let first = Arc::clone(&order);
        let second = Arc::clone(&order);
        let mut actions: Vec<BoxedAction> = vec![
            Box::new(move || first.lock().unwrap().push(1)),
            Box::new(move || second.lock().unwrap().push(2)),
        ];

        run_all(&mut actions);

        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }
}
