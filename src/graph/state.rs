//! State records.

use super::transition::Transition;
use crate::core::{run_all, Action, BoxedAction, Guard, StateId, StateKey};
use crate::timing::DeferredCallback;
use std::fmt;
use std::time::Duration;

/// One node of the graph with everything that runs while it is active.
///
/// Entry actions run once per activation, loop actions every tick, exit
/// actions when a transition fires (unless the transition brings its own).
/// Transitions are tried in the order they were added; the first one that is
/// ready wins.
///
/// Fallback states are skipped by default ("next state") transitions and can
/// only be reached through an explicit target.
///
/// # Example
///
/// ```rust
/// use tickstate::graph::{State, Transition};
/// use std::time::Duration;
///
/// let state = State::new("Extend")
///     .on_enter(|| println!("extending"))
///     .after(Duration::from_millis(200), || println!("extension settled"))
///     .transition(Transition::when(|| true));
///
/// assert_eq!(state.id().to_string(), "Extend");
/// assert_eq!(state.transitions().len(), 1);
/// assert!(!state.is_fallback());
/// ```
pub struct State {
    pub(crate) id: StateId,
    pub(crate) enter: Vec<BoxedAction>,
    pub(crate) exit: Vec<BoxedAction>,
    pub(crate) looping: Vec<BoxedAction>,
    pub(crate) deferred: Vec<DeferredCallback>,
    pub(crate) transitions: Vec<Transition>,
    pub(crate) min_dwell: Option<Guard>,
    pub(crate) fallback: bool,
}

impl State {
    /// Linear state named by `key`, with no actions and no transitions.
    pub fn new(key: impl StateKey) -> Self {
        Self::with_id(StateId::named(key))
    }

    /// State with an explicit identity, for example an anonymous one.
    pub fn with_id(id: StateId) -> Self {
        Self {
            id,
            enter: Vec::new(),
            exit: Vec::new(),
            looping: Vec::new(),
            deferred: Vec::new(),
            transitions: Vec::new(),
            min_dwell: None,
            fallback: false,
        }
    }

    /// Fallback state, reachable only through explicit targets.
    pub fn fallback(key: impl StateKey) -> Self {
        Self::new(key).into_fallback()
    }

    /// Move this state into the fallback pool.
    pub fn into_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    /// Action run once, on the first tick of each activation.
    pub fn on_enter<A>(mut self, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        self.enter.push(Box::new(action));
        self
    }

    /// Action run when a transition fires, unless that transition brings
    /// its own exit actions.
    pub fn on_exit<A>(mut self, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        self.exit.push(Box::new(action));
        self
    }

    /// Action run on every tick while the state is active.
    pub fn on_loop<A>(mut self, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        self.looping.push(Box::new(action));
        self
    }

    /// Deferred callback on the system clock.
    ///
    /// Callbacks run in the order they were added; add them shortest delay
    /// first (the builder sorts them for you).
    pub fn after<A>(self, delay: Duration, action: A) -> Self
    where
        A: Action + Send + 'static,
    {
        self.deferred(DeferredCallback::new(delay, action))
    }

    /// Add a prepared deferred callback, for example one on a custom clock.
    pub fn deferred(mut self, callback: DeferredCallback) -> Self {
        self.deferred.push(callback);
        self
    }

    /// Append an outgoing transition. Earlier transitions take priority.
    pub fn transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Minimum time in this state before any transition may fire.
    pub fn min_dwell(self, duration: Duration) -> Self {
        self.min_dwell_guard(Guard::elapsed(duration))
    }

    /// Guard that must pass before any transition may fire. A predicate
    /// guard is re-evaluated every tick; a timed one starts on entry.
    pub fn min_dwell_guard(mut self, guard: Guard) -> Self {
        self.min_dwell = Some(guard);
        self
    }

    pub fn id(&self) -> &StateId {
        &self.id
    }

    /// Whether the state is only reachable through explicit targets.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Outgoing transitions in priority order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn deferred_callbacks(&self) -> &[DeferredCallback] {
        &self.deferred
    }

    pub fn has_loop_actions(&self) -> bool {
        !self.looping.is_empty()
    }

    pub fn has_min_dwell(&self) -> bool {
        self.min_dwell.is_some()
    }

    /// Nothing left to do: no transitions, no loop actions and every deferred
    /// callback has already fired.
    pub(crate) fn is_terminal(&self) -> bool {
        self.transitions.is_empty()
            && self.looping.is_empty()
            && self.deferred.iter().all(DeferredCallback::is_done)
    }

    pub(crate) fn run_enter(&mut self) {
        run_all(&mut self.enter);
    }

    pub(crate) fn run_loop(&mut self) {
        run_all(&mut self.looping);
    }

    pub(crate) fn arm_min_dwell(&mut self) {
        if let Some(dwell) = self.min_dwell.as_mut() {
            dwell.arm();
        }
    }

    /// Arm and poll every deferred callback. Returns how many fired and
    /// whether all of them are done.
    pub(crate) fn poll_deferred(&mut self) -> (usize, bool) {
        let mut fired = 0;
        let mut all_done = true;
        for callback in self.deferred.iter_mut() {
            callback.arm();
            if callback.poll() {
                fired += 1;
            }
            all_done &= callback.is_done();
        }
        (fired, all_done)
    }

    /// Index of the first ready transition, if any.
    ///
    /// Every transition before the winner gets its timers armed; scanning
    /// stops at the winner.
    pub(crate) fn first_ready_transition(&mut self) -> Option<usize> {
        let Self {
            transitions,
            min_dwell,
            ..
        } = self;
        for (index, transition) in transitions.iter_mut().enumerate() {
            transition.arm();
            if transition.is_ready() && min_dwell.as_mut().is_none_or(Guard::check) {
                return Some(index);
            }
        }
        None
    }

    /// Exit actions for leaving through the given transition.
    pub(crate) fn run_exit(&mut self, via: usize) {
        match self
            .transitions
            .get_mut(via)
            .and_then(|t| t.exit_override.as_mut())
        {
            Some(overrides) => run_all(overrides),
            None => run_all(&mut self.exit),
        }
    }

    /// Reset deferred callbacks and every timer so the next activation
    /// starts fresh.
    pub(crate) fn reset_timers(&mut self) {
        for callback in self.deferred.iter_mut() {
            callback.reset();
        }
        for transition in self.transitions.iter_mut() {
            transition.reset();
        }
        if let Some(dwell) = self.min_dwell.as_mut() {
            dwell.reset();
        }
    }

    pub(crate) fn sort_deferred(&mut self) {
        self.deferred.sort_by_key(DeferredCallback::duration);
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("enter", &self.enter.len())
            .field("exit", &self.exit.len())
            .field("looping", &self.looping.len())
            .field("deferred", &self.deferred)
            .field("transitions", &self.transitions)
            .field("min_dwell", &self.min_dwell)
            .field("fallback", &self.fallback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::FakeClock;
    use std::sync::{Arc, Mutex};

    fn log() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn push(log: &Arc<Mutex<Vec<&'static str>>>, entry: &'static str) -> impl FnMut() + Send {
        let log = Arc::clone(log);
        move || log.lock().unwrap().push(entry)
    }

    #[test]
    fn empty_state_is_terminal() {
        assert!(State::new("Done").is_terminal());
        assert!(!State::new("Spin").on_loop(|| {}).is_terminal());
        assert!(!State::new("Wait").transition(Transition::when(|| false)).is_terminal());
    }

    #[test]
    fn pending_deferred_callback_keeps_state_alive() {
        let clock = FakeClock::new();
        let mut state = State::new("Beep").deferred(DeferredCallback::with_clock(
            Duration::from_secs(1),
            || {},
            clock.shared(),
        ));

        assert!(!state.is_terminal());

        state.poll_deferred();
        clock.advance(Duration::from_secs(1));
        let (fired, all_done) = state.poll_deferred();

        assert_eq!(fired, 1);
        assert!(all_done);
        assert!(state.is_terminal());
    }

    #[test]
    fn first_ready_transition_wins() {
        let mut state = State::new("Fork")
            .transition(Transition::when(|| false).to("A"))
            .transition(Transition::when(|| true).to("B"))
            .transition(Transition::when(|| true).to("C"));

        assert_eq!(state.first_ready_transition(), Some(1));
    }

    #[test]
    fn state_dwell_blocks_every_transition() {
        let clock = FakeClock::new();
        let mut state = State::new("Hold")
            .min_dwell_guard(Guard::elapsed_on(Duration::from_secs(2), clock.shared()))
            .transition(Transition::when(|| true));

        state.arm_min_dwell();
        assert_eq!(state.first_ready_transition(), None);

        clock.advance(Duration::from_secs(2));
        assert_eq!(state.first_ready_transition(), Some(0));
    }

    #[test]
    fn predicate_dwell_gates_transitions_and_ignores_timers() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let open = Arc::new(AtomicBool::new(false));
        let gate = Arc::clone(&open);
        let mut state = State::new("Hold")
            .min_dwell_guard(Guard::when(move || gate.load(Ordering::SeqCst)))
            .transition(Transition::when(|| true));

        state.arm_min_dwell();
        assert_eq!(state.first_ready_transition(), None);

        open.store(true, Ordering::SeqCst);
        assert_eq!(state.first_ready_transition(), Some(0));

        state.reset_timers();
        assert!(state.has_min_dwell());
        assert_eq!(state.first_ready_transition(), Some(0));

        open.store(false, Ordering::SeqCst);
        state.arm_min_dwell();
        assert_eq!(state.first_ready_transition(), None);
    }

    #[test]
    fn exit_override_replaces_state_exit() {
        let log = log();
        let mut state = State::new("Grab")
            .on_exit(push(&log, "default"))
            .transition(Transition::when(|| true).with_exit(push(&log, "override")))
            .transition(Transition::when(|| true));

        state.run_exit(0);
        state.run_exit(1);

        assert_eq!(*log.lock().unwrap(), vec!["override", "default"]);
    }

    #[test]
    fn sort_deferred_orders_by_duration() {
        let mut state = State::new("Sequence")
            .after(Duration::from_secs(3), || {})
            .after(Duration::from_secs(1), || {})
            .after(Duration::from_secs(2), || {});

        state.sort_deferred();

        let order: Vec<u64> = state
            .deferred_callbacks()
            .iter()
            .map(|d| d.duration().as_secs())
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn reset_timers_rearms_everything() {
        let clock = FakeClock::new();
        let mut state = State::new("Timed")
            .min_dwell_guard(Guard::elapsed_on(Duration::ZERO, clock.shared()))
            .deferred(DeferredCallback::with_clock(Duration::ZERO, || {}, clock.shared()))
            .transition(Transition::new(Guard::elapsed_on(Duration::ZERO, clock.shared())));

        state.arm_min_dwell();
        state.poll_deferred();
        assert_eq!(state.first_ready_transition(), Some(0));

        state.reset_timers();

        assert!(state.deferred_callbacks().iter().all(|d| !d.is_armed() && !d.is_done()));
        // Dwell disarmed: transition is re-armed on scan but the dwell is not.
        assert_eq!(state.first_ready_transition(), None);
    }
}
