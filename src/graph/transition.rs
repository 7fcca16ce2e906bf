//! Outgoing transitions of a state.

use crate::core::{Action, BoxedAction, Condition, Guard, StateId, StateKey};
use std::fmt;
use std::time::Duration;

/// Edge from the owning state to a target state.
///
/// Without an explicit target the transition leads to the next state in
/// linear order. The target is resolved when the transition first fires, not
/// when the graph is built.
///
/// # Example
///
/// ```rust
/// use tickstate::graph::Transition;
/// use std::time::Duration;
///
/// let transition = Transition::when(|| true)
///     .to("Retract")
///     .with_exit(|| println!("leaving through the sensor edge"))
///     .min_dwell(Duration::from_millis(500));
///
/// assert_eq!(transition.target().map(|id| id.to_string()), Some("Retract".into()));
/// assert!(transition.has_exit_override());
/// ```
pub struct Transition {
    pub(crate) condition: Guard,
    pub(crate) target: Option<StateId>,
    pub(crate) exit_override: Option<Vec<BoxedAction>>,
    pub(crate) min_dwell: Option<Guard>,
}

impl Transition {
    /// Transition to the next linear state, gated by `condition`.
    pub fn new(condition: Guard) -> Self {
        Self {
            condition,
            target: None,
            exit_override: None,
            min_dwell: None,
        }
    }

    /// Transition gated by a predicate.
    pub fn when<C>(condition: C) -> Self
    where
        C: Condition + Send + 'static,
    {
        Self::new(Guard::when(condition))
    }

    /// Transition that fires once `duration` has passed in the source state.
    pub fn after(duration: Duration) -> Self {
        Self::new(Guard::elapsed(duration))
    }

    /// Explicit target state.
    pub fn to(self, key: impl StateKey) -> Self {
        self.to_id(StateId::named(key))
    }

    /// Explicit target given as a [`StateId`], which may be anonymous.
    pub fn to_id(mut self, target: StateId) -> Self {
        self.target = Some(target);
        self
    }

    /// Add an exit action that replaces the source state's own exit actions
    /// whenever this transition fires.
    pub fn with_exit<A>(mut self, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        self.exit_override
            .get_or_insert_with(Vec::new)
            .push(Box::new(action));
        self
    }

    /// Minimum time in the source state before this transition may fire.
    pub fn min_dwell(self, duration: Duration) -> Self {
        self.min_dwell_guard(Guard::elapsed(duration))
    }

    pub fn min_dwell_guard(mut self, guard: Guard) -> Self {
        self.min_dwell = Some(guard);
        self
    }

    /// Explicit target, or `None` for "next linear state".
    pub fn target(&self) -> Option<&StateId> {
        self.target.as_ref()
    }

    pub fn has_exit_override(&self) -> bool {
        self.exit_override.is_some()
    }

    pub fn is_timed(&self) -> bool {
        self.condition.is_timed()
    }

    /// Arm the timers of the condition and of the per-transition dwell.
    pub(crate) fn arm(&mut self) {
        self.condition.arm();
        if let Some(dwell) = self.min_dwell.as_mut() {
            dwell.arm();
        }
    }

    pub(crate) fn reset(&mut self) {
        self.condition.reset();
        if let Some(dwell) = self.min_dwell.as_mut() {
            dwell.reset();
        }
    }

    /// Own condition and per-transition dwell, in that order.
    pub(crate) fn is_ready(&mut self) -> bool {
        self.condition.check() && self.min_dwell.as_mut().is_none_or(Guard::check)
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("condition", &self.condition)
            .field("target", &self.target)
            .field("exit_override", &self.exit_override.as_ref().map(Vec::len))
            .field("min_dwell", &self.min_dwell)
            .finish()
    }
}
