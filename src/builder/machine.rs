//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::core::{Action, BoxedAction, Condition, Guard, StateId, StateKey};
use crate::engine::{MachineOptions, StateMachine};
use crate::graph::{validate, State, Transition};
use crate::timing::{system_clock, Clock, DeferredCallback};
use std::sync::Arc;
use std::time::Duration;
use stillwater::validation::Validation;

/// Builder for constructing state machines with a fluent API.
///
/// States are declared in order with [`state`](Self::state); every other
/// call applies to the most recently declared state. Timers created by the
/// builder read the builder's clock, so set [`clock`](Self::clock) before
/// declaring states.
///
/// # Example
///
/// ```
/// use tickstate::builder::StateMachineBuilder;
/// use std::time::Duration;
///
/// let mut machine = StateMachineBuilder::new()
///     .state("Extend")
///     .on_enter(|| println!("extending"))
///     .transition_timed(Duration::ZERO)
///     .state("Retract")
///     .on_loop(|| println!("retracting"))
///     .build()
///     .unwrap();
///
/// machine.start();
/// machine.update().unwrap();
/// assert_eq!(machine.current_state_name(), "Retract");
/// ```
pub struct StateMachineBuilder {
    states: Vec<State>,
    tick_hooks: Vec<BoxedAction>,
    clock: Arc<dyn Clock>,
    options: MachineOptions,
    anonymous: u32,
    error: Option<BuildError>,
}

impl StateMachineBuilder {
    /// Create a new builder on the system clock.
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            tick_hooks: Vec::new(),
            clock: system_clock(),
            options: MachineOptions::default(),
            anonymous: 0,
            error: None,
        }
    }

    /// Clock used by every timer created afterwards.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Number of state changes kept in the machine's history.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.options.history_capacity = capacity;
        self
    }

    /// Action run at the start of every tick while the machine is running,
    /// whatever the current state.
    pub fn every_tick<A>(mut self, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        self.tick_hooks.push(Box::new(action));
        self
    }

    /// Declare a state. It joins the linear order.
    pub fn state(mut self, key: impl StateKey) -> Self {
        self.states.push(State::new(key));
        self
    }

    /// Declare a fallback state, reachable only through explicit targets.
    pub fn fallback_state(mut self, key: impl StateKey) -> Self {
        self.states.push(State::fallback(key));
        self
    }

    /// Declare an anonymous state that moves to the next linear state after
    /// `duration`.
    pub fn wait_state(self, duration: Duration) -> Self {
        self.push_wait_state(duration, None)
    }

    /// Declare an anonymous state that moves to `target` after `duration`.
    pub fn wait_state_to(self, duration: Duration, target: impl StateKey) -> Self {
        self.push_wait_state(duration, Some(StateId::named(target)))
    }

    fn push_wait_state(mut self, duration: Duration, target: Option<StateId>) -> Self {
        let mut transition = Transition::new(self.elapsed(duration));
        transition.target = target;
        let id = StateId::Anonymous(self.anonymous);
        self.anonymous += 1;
        self.states.push(State::with_id(id).transition(transition));
        self
    }

    pub fn on_enter<A>(self, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        self.edit_state("on_enter", |state, _| state.enter.push(Box::new(action)))
    }

    /// Exit action, skipped when the firing transition brings its own.
    pub fn on_exit<A>(self, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        self.edit_state("on_exit", |state, _| state.exit.push(Box::new(action)))
    }

    /// Action run every tick while the state is active.
    pub fn on_loop<A>(self, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        self.edit_state("on_loop", |state, _| state.looping.push(Box::new(action)))
    }

    /// One-shot action run `delay` after the state became active.
    pub fn after<A>(self, delay: Duration, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        self.edit_state("after", |state, clock| {
            state
                .deferred
                .push(DeferredCallback::with_clock(delay, action, clock))
        })
    }

    /// Minimum time in the state before any of its transitions may fire.
    pub fn min_time(self, duration: Duration) -> Self {
        let guard = self.elapsed(duration);
        self.edit_state("min_time", |state, _| state.min_dwell = Some(guard))
    }

    /// Condition that must hold before any of the state's transitions may fire.
    pub fn min_time_when<C>(self, condition: C) -> Self
    where
        C: Condition + Send + 'static,
    {
        self.edit_state("min_time_when", |state, _| {
            state.min_dwell = Some(Guard::when(condition))
        })
    }

    /// Add a prepared transition to the current state.
    pub fn add_transition(self, transition: Transition) -> Self {
        self.edit_state("add_transition", |state, _| {
            state.transitions.push(transition)
        })
    }

    /// Move to the next linear state when `condition` holds.
    pub fn transition<C>(self, condition: C) -> Self
    where
        C: Condition + Send + 'static,
    {
        self.add_transition(Transition::when(condition))
    }

    /// Move to `target` when `condition` holds.
    pub fn transition_to<C>(self, condition: C, target: impl StateKey) -> Self
    where
        C: Condition + Send + 'static,
    {
        self.add_transition(Transition::when(condition).to(target))
    }

    /// Move to the next linear state when `condition` holds, running `exit`
    /// instead of the state's exit actions.
    pub fn transition_with_exit<C, A>(self, condition: C, exit: A) -> Self
    where
        C: Condition + Send + 'static,
        A: Action + Send + 'static,
    {
        self.add_transition(Transition::when(condition).with_exit(exit))
    }

    /// Move to `target` when `condition` holds, running `exit` instead of the
    /// state's exit actions.
    pub fn transition_to_with_exit<C, A>(self, condition: C, target: impl StateKey, exit: A) -> Self
    where
        C: Condition + Send + 'static,
        A: Action + Send + 'static,
    {
        self.add_transition(Transition::when(condition).to(target).with_exit(exit))
    }

    /// Move to the next linear state after `duration`.
    pub fn transition_timed(self, duration: Duration) -> Self {
        let guard = self.elapsed(duration);
        self.add_transition(Transition::new(guard))
    }

    /// Move to `target` after `duration`.
    pub fn transition_timed_to(self, duration: Duration, target: impl StateKey) -> Self {
        let guard = self.elapsed(duration);
        self.add_transition(Transition::new(guard).to(target))
    }

    /// Move to the next linear state after `duration`, running `exit` instead
    /// of the state's exit actions.
    pub fn transition_timed_with_exit<A>(self, duration: Duration, exit: A) -> Self
    where
        A: Action + Send + 'static,
    {
        let guard = self.elapsed(duration);
        self.add_transition(Transition::new(guard).with_exit(exit))
    }

    /// Move to `target` after `duration`, running `exit` instead of the
    /// state's exit actions.
    pub fn transition_timed_to_with_exit<A>(
        self,
        duration: Duration,
        target: impl StateKey,
        exit: A,
    ) -> Self
    where
        A: Action + Send + 'static,
    {
        let guard = self.elapsed(duration);
        self.add_transition(Transition::new(guard).to(target).with_exit(exit))
    }

    /// Minimum time in the state before the most recently added transition
    /// may fire.
    pub fn with_min_time(self, duration: Duration) -> Self {
        let guard = self.elapsed(duration);
        self.try_edit_state("with_min_time", |state, _| {
            let Some(transition) = state.transitions.last_mut() else {
                return Err(BuildError::NoOpenTransition {
                    state: state.id().clone(),
                });
            };
            transition.min_dwell = Some(guard);
            Ok(())
        })
    }

    /// The declared states, with deferred callbacks sorted shortest delay
    /// first.
    pub fn into_states(self) -> Result<Vec<State>, BuildError> {
        self.finish().map(|(states, _, _)| states)
    }

    /// Build the state machine.
    ///
    /// Transition targets are resolved when they fire; use
    /// [`build_checked`](Self::build_checked) to catch unknown targets now.
    pub fn build(self) -> Result<StateMachine, BuildError> {
        let (states, tick_hooks, options) = self.finish()?;
        let mut machine = StateMachine::with_options(states, options)?;
        machine.set_tick_hooks(tick_hooks);
        Ok(machine)
    }

    /// Validate the whole graph, then build it.
    ///
    /// Reports every violation found, not just the first.
    pub fn build_checked(self) -> Result<StateMachine, BuildError> {
        let (states, tick_hooks, options) = self.finish()?;
        if let Validation::Failure(errors) = validate(&states) {
            return Err(BuildError::Invalid(errors.iter().cloned().collect()));
        }
        let mut machine = StateMachine::with_options(states, options)?;
        machine.set_tick_hooks(tick_hooks);
        Ok(machine)
    }

    fn finish(self) -> Result<(Vec<State>, Vec<BoxedAction>, MachineOptions), BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut states = self.states;
        for state in states.iter_mut() {
            state.sort_deferred();
        }
        Ok((states, self.tick_hooks, self.options))
    }

    fn elapsed(&self, duration: Duration) -> Guard {
        Guard::elapsed_on(duration, Arc::clone(&self.clock))
    }

    /// Apply `edit` to the most recently declared state.
    fn edit_state<F>(self, call: &'static str, edit: F) -> Self
    where
        F: FnOnce(&mut State, Arc<dyn Clock>),
    {
        self.try_edit_state(call, |state, clock| {
            edit(state, clock);
            Ok(())
        })
    }

    /// Like `edit_state`, for edits that can fail. The first misuse is kept
    /// and reported by `build`.
    fn try_edit_state<F>(mut self, call: &'static str, edit: F) -> Self
    where
        F: FnOnce(&mut State, Arc<dyn Clock>) -> Result<(), BuildError>,
    {
        if self.error.is_some() {
            return self;
        }
        let clock = Arc::clone(&self.clock);
        let outcome = match self.states.last_mut() {
            Some(state) => edit(state, clock),
            None => Err(BuildError::NoOpenState { call }),
        };
        self.error = outcome.err();
        self
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MachineError;
    use crate::graph::GraphViolation;
    use crate::timing::FakeClock;

    #[test]
    fn builder_requires_a_state() {
        let result = StateMachineBuilder::new().build();
        assert!(matches!(
            result,
            Err(BuildError::Machine(MachineError::EmptyGraph))
        ));
    }

    #[test]
    fn state_scoped_call_before_state_is_reported() {
        let result = StateMachineBuilder::new()
            .on_enter(|| {})
            .state("A")
            .build();

        assert!(matches!(
            result,
            Err(BuildError::NoOpenState { call: "on_enter" })
        ));
    }

    #[test]
    fn with_min_time_needs_a_transition() {
        let result = StateMachineBuilder::new()
            .state("A")
            .with_min_time(Duration::from_secs(1))
            .build();

        assert!(matches!(result, Err(BuildError::NoOpenTransition { .. })));
    }

    #[test]
    fn fluent_api_builds_machine() {
        let machine = StateMachineBuilder::new()
            .state("Initial")
            .transition(|| true)
            .state("Processing")
            .transition_to(|| true, "Complete")
            .fallback_state("Recover")
            .transition_to(|| true, "Initial")
            .state("Complete")
            .build();

        assert!(machine.is_ok());
        let machine = machine.unwrap();
        assert_eq!(machine.current_state_name(), "Initial");
        assert!(machine.state("Recover").is_some_and(State::is_fallback));
    }

    #[test]
    fn wait_states_are_anonymous_and_numbered() {
        let states = StateMachineBuilder::new()
            .state("A")
            .transition(|| true)
            .wait_state(Duration::from_secs(1))
            .wait_state_to(Duration::from_secs(2), "A")
            .into_states()
            .unwrap();

        assert_eq!(states[1].id(), &StateId::Anonymous(0));
        assert_eq!(states[2].id(), &StateId::Anonymous(1));
        assert!(states[1].transitions()[0].is_timed());
        assert_eq!(
            states[2].transitions()[0].target(),
            Some(&StateId::named("A"))
        );
    }

    #[test]
    fn deferred_callbacks_are_sorted_at_build() {
        let states = StateMachineBuilder::new()
            .state("Sequence")
            .after(Duration::from_secs(1), || {})
            .after(Duration::from_secs(3), || {})
            .after(Duration::from_secs(2), || {})
            .into_states()
            .unwrap();

        let order: Vec<u64> = states[0]
            .deferred_callbacks()
            .iter()
            .map(|d| d.duration().as_secs())
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn build_checked_reports_every_violation() {
        let result = StateMachineBuilder::new()
            .state("A")
            .transition_to(|| true, "Nowhere")
            .state("B")
            .transition(|| true)
            .build_checked();

        match result {
            Err(BuildError::Invalid(violations)) => {
                assert_eq!(violations.len(), 2);
                assert!(violations
                    .iter()
                    .any(|v| matches!(v, GraphViolation::UnknownTarget { .. })));
                assert!(violations
                    .iter()
                    .any(|v| matches!(v, GraphViolation::DanglingDefault { .. })));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn build_checked_accepts_valid_graph() {
        let result = StateMachineBuilder::new()
            .state("A")
            .transition(|| true)
            .state("B")
            .transition_to(|| true, "A")
            .build_checked();

        assert!(result.is_ok());
    }

    #[test]
    fn builder_timers_use_builder_clock() {
        let clock = FakeClock::new();
        let mut machine = StateMachineBuilder::new()
            .clock(clock.shared())
            .state("A")
            .transition_timed(Duration::from_secs(5))
            .state("B")
            .on_loop(|| {})
            .build()
            .unwrap();

        machine.start();
        machine.update().unwrap();
        assert!(machine.is_in("A"));

        clock.advance(Duration::from_secs(5));
        machine.update().unwrap();
        assert!(machine.is_in("B"));
    }

    #[test]
    fn timed_exit_transitions_use_builder_clock() {
        let clock = FakeClock::new();
        let exits = Arc::new(std::sync::Mutex::new(Vec::new()));
        let first = Arc::clone(&exits);
        let second = Arc::clone(&exits);
        let default = Arc::clone(&exits);
        let mut machine = StateMachineBuilder::new()
            .clock(clock.shared())
            .state("A")
            .on_exit(move || default.lock().unwrap().push("default"))
            .transition_timed_with_exit(Duration::from_secs(2), move || {
                first.lock().unwrap().push("A")
            })
            .state("B")
            .transition_timed_to_with_exit(Duration::from_secs(1), "A", move || {
                second.lock().unwrap().push("B")
            })
            .build()
            .unwrap();

        machine.start();
        machine.update().unwrap();
        clock.advance(Duration::from_secs(2));
        machine.update().unwrap();
        assert!(machine.is_in("B"));

        machine.update().unwrap();
        clock.advance(Duration::from_secs(1));
        machine.update().unwrap();

        assert!(machine.is_in("A"));
        assert_eq!(*exits.lock().unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn unbounded_history_capacity_builds() {
        let mut machine = StateMachineBuilder::new()
            .history_capacity(usize::MAX)
            .state("A")
            .transition(|| true)
            .state("B")
            .on_loop(|| {})
            .build()
            .unwrap();

        machine.start();
        machine.update().unwrap();

        assert_eq!(machine.history().len(), 1);
        assert_eq!(machine.history().capacity(), usize::MAX);
    }

    #[test]
    fn history_capacity_is_applied() {
        let mut machine = StateMachineBuilder::new()
            .history_capacity(0)
            .state("A")
            .transition(|| true)
            .state("B")
            .on_loop(|| {})
            .build()
            .unwrap();

        machine.start();
        machine.update().unwrap();

        assert!(machine.is_in("B"));
        assert!(machine.history().is_empty());
    }
}
