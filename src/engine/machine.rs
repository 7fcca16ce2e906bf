//! Tick-driven state machine.

use crate::core::{
    run_all, BoxedAction, StateChange, StateHistory, StateId, StateKey, DEFAULT_HISTORY_CAPACITY,
};
use crate::engine::error::MachineError;
use crate::graph::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace, warn};

/// Which pool a state lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pool {
    /// Visited in declaration order by default transitions
    Linear,
    /// Reachable only through explicit targets
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Placement {
    pool: Pool,
    index: usize,
}

/// Transition resolved on this tick, applied at commit.
#[derive(Clone, Copy, Debug)]
struct Pending {
    target: Placement,
    via: usize,
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineOptions {
    /// Number of committed state changes kept in [`StateMachine::history`].
    /// Zero disables the history.
    pub history_capacity: usize,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Serialisable snapshot of the engine's runtime flags, for diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineStatus {
    /// The active state
    pub current: StateId,
    /// Pool the active state belongs to
    pub pool: Pool,
    /// Whether `update` currently does anything
    pub running: bool,
    /// Whether the active state's entry actions have run
    pub entered: bool,
    /// Ticks run so far
    pub ticks: u64,
}

/// Execution engine for a state graph.
///
/// Built once from an ordered list of [`State`]s, then driven by calling
/// [`update`](Self::update) once per iteration of the caller's control loop.
/// States flagged as fallback are kept apart from the linear order: default
/// transitions never lead into them.
///
/// # Example
///
/// ```rust
/// use tickstate::engine::StateMachine;
/// use tickstate::graph::{State, Transition};
///
/// let mut machine = StateMachine::new(vec![
///     State::new("Extend").transition(Transition::when(|| true)),
///     State::new("Retract").transition(Transition::when(|| true).to("Extend")),
/// ])
/// .unwrap();
///
/// machine.start();
/// assert_eq!(machine.current_state_name(), "Extend");
///
/// machine.update().unwrap();
/// assert_eq!(machine.current_state_name(), "Retract");
///
/// machine.update().unwrap();
/// assert_eq!(machine.current_state_name(), "Extend");
/// ```
pub struct StateMachine {
    linear: Vec<State>,
    fallback: Vec<State>,
    linear_index: HashMap<StateId, usize>,
    fallback_index: HashMap<StateId, usize>,
    tick_hooks: Vec<BoxedAction>,
    current: Placement,
    pending: Option<Pending>,
    running: bool,
    entered: bool,
    ticks: u64,
    history: StateHistory,
}

impl StateMachine {
    /// Build an engine with default options.
    pub fn new(states: Vec<State>) -> Result<Self, MachineError> {
        Self::with_options(states, MachineOptions::default())
    }

    /// Build an engine, partitioning `states` into the linear and fallback
    /// pools while preserving their relative order.
    ///
    /// Fails with [`MachineError::EmptyGraph`] when there is no linear state
    /// to start from and with [`MachineError::DuplicateState`] when two
    /// states share a name.
    pub fn with_options(states: Vec<State>, options: MachineOptions) -> Result<Self, MachineError> {
        let (fallback, linear): (Vec<State>, Vec<State>) =
            states.into_iter().partition(State::is_fallback);

        if linear.is_empty() {
            return Err(MachineError::EmptyGraph);
        }

        let linear_index = index_pool(&linear, &HashMap::new())?;
        let fallback_index = index_pool(&fallback, &linear_index)?;

        debug!(
            linear = linear.len(),
            fallback = fallback.len(),
            "state machine constructed"
        );

        Ok(Self {
            linear,
            fallback,
            linear_index,
            fallback_index,
            tick_hooks: Vec::new(),
            current: Placement {
                pool: Pool::Linear,
                index: 0,
            },
            pending: None,
            running: false,
            entered: false,
            ticks: 0,
            history: StateHistory::with_capacity(options.history_capacity),
        })
    }

    /// Actions run at the start of every running tick, before any state logic.
    pub(crate) fn set_tick_hooks(&mut self, hooks: Vec<BoxedAction>) {
        self.tick_hooks = hooks;
    }

    /// Start running. Entry actions of the current state fire on the next
    /// [`update`](Self::update).
    pub fn start(&mut self) {
        debug!(state = %self.current_state(), "starting state machine");
        self.running = true;
    }

    /// Stop running. [`update`](Self::update) does nothing until
    /// [`start`](Self::start) or [`reset`](Self::reset).
    pub fn stop(&mut self) {
        debug!(state = %self.current_state(), "stopping state machine");
        self.running = false;
    }

    /// Jump back to the first linear state and start running.
    ///
    /// The entered flag and the timers of the state being left are kept
    /// as they are: only call this between ticks.
    pub fn reset(&mut self) {
        self.current = Placement {
            pool: Pool::Linear,
            index: 0,
        };
        self.pending = None;
        self.running = true;
        debug!(state = %self.current_state(), "state machine reset");
    }

    /// Jump straight to the named state, without running exit or entry
    /// actions.
    pub fn set_state(&mut self, key: impl StateKey) -> Result<(), MachineError> {
        let id = StateId::named(key);
        let placement = self
            .locate(&id)
            .ok_or(MachineError::InvalidState { name: id })?;
        debug!(from = %self.current_state(), to = %self.state_at(placement).id(), "state set directly");
        self.current = placement;
        Ok(())
    }

    /// Whether [`update`](Self::update) will run the next tick.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Identity of the active state.
    pub fn current_state(&self) -> &StateId {
        self.state_at(self.current).id()
    }

    /// Display name of the active state. Wait states render as
    /// `<anonymous #n>`.
    pub fn current_state_name(&self) -> String {
        self.current_state().to_string()
    }

    /// Whether the current state has the given name.
    pub fn is_in(&self, key: impl StateKey) -> bool {
        self.current_state().as_name() == Some(key.key())
    }

    /// Look up a state in either pool.
    pub fn state(&self, key: impl StateKey) -> Option<&State> {
        self.locate(&StateId::named(key))
            .map(|placement| self.state_at(placement))
    }

    /// Number of ticks run while the machine was running.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Most recent committed state changes, oldest first.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tickstate::engine::StateMachine;
    /// use tickstate::graph::{State, Transition};
    ///
    /// let mut machine = StateMachine::new(vec![
    ///     State::new("A").transition(Transition::when(|| true)),
    ///     State::new("B").on_loop(|| {}),
    /// ])
    /// .unwrap();
    ///
    /// machine.start();
    /// machine.update().unwrap();
    ///
    /// let change = machine.history().last().unwrap();
    /// assert_eq!(change.to.to_string(), "B");
    /// assert_eq!(change.tick, 1);
    /// ```
    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Snapshot of the runtime flags.
    pub fn status(&self) -> MachineStatus {
        MachineStatus {
            current: self.current_state().clone(),
            pool: self.current.pool,
            running: self.running,
            entered: self.entered,
            ticks: self.ticks,
        }
    }

    /// Run one tick.
    ///
    /// In order: tick hooks, auto-stop check, entry actions (first tick of an
    /// activation), dwell arming, deferred callbacks, loop actions, transition
    /// resolution, exit actions and commit. Errors from resolution leave the
    /// machine in the current state and are returned as-is.
    pub fn update(&mut self) -> Result<(), MachineError> {
        if !self.running {
            return Ok(());
        }
        self.ticks += 1;
        let tick = self.ticks;
        let current = self.current;

        run_all(&mut self.tick_hooks);

        if self.state_at(current).is_terminal() {
            debug!(
                state = %self.current_state(),
                tick,
                "no transitions, loop actions or pending callbacks left"
            );
            self.stop();
        }

        if !self.entered {
            self.state_at_mut(current).run_enter();
            self.entered = true;
        }

        let state = self.state_at_mut(current);
        state.arm_min_dwell();

        let (fired, all_done) = state.poll_deferred();
        if fired > 0 {
            trace!(state = %state.id(), fired, all_done, tick, "deferred callbacks fired");
        }

        state.run_loop();

        if let Some(via) = state.first_ready_transition() {
            let target = state.transitions[via].target.clone();
            let target = self.resolve(current, target.as_ref())?;
            self.pending = Some(Pending { target, via });
        }

        if let Some(pending) = self.pending {
            self.state_at_mut(current).run_exit(pending.via);
        }

        if let Some(pending) = self.pending.take() {
            self.commit(current, pending.target, tick);
        }

        Ok(())
    }

    fn commit(&mut self, from: Placement, to: Placement, tick: u64) {
        self.state_at_mut(from).reset_timers();
        self.current = to;
        self.entered = false;

        let change = StateChange {
            from: self.state_at(from).id().clone(),
            to: self.state_at(to).id().clone(),
            timestamp: Utc::now(),
            tick,
        };
        debug!(from = %change.from, to = %change.to, tick, "transition committed");
        self.history.record(change);
    }

    fn resolve(&self, from: Placement, target: Option<&StateId>) -> Result<Placement, MachineError> {
        let resolved = match target {
            Some(id) => self
                .locate(id)
                .ok_or_else(|| MachineError::InvalidState { name: id.clone() }),
            None if from.pool == Pool::Linear && from.index + 1 < self.linear.len() => {
                Ok(Placement {
                    pool: Pool::Linear,
                    index: from.index + 1,
                })
            }
            None => Err(MachineError::TransitionWithoutNextState {
                from: self.state_at(from).id().clone(),
            }),
        };
        resolved.inspect_err(|error| warn!(%error, "transition could not be resolved"))
    }

    fn locate(&self, id: &StateId) -> Option<Placement> {
        if let Some(&index) = self.linear_index.get(id) {
            return Some(Placement {
                pool: Pool::Linear,
                index,
            });
        }
        self.fallback_index.get(id).map(|&index| Placement {
            pool: Pool::Fallback,
            index,
        })
    }

    fn state_at(&self, placement: Placement) -> &State {
        match placement.pool {
            Pool::Linear => &self.linear[placement.index],
            Pool::Fallback => &self.fallback[placement.index],
        }
    }

    fn state_at_mut(&mut self, placement: Placement) -> &mut State {
        match placement.pool {
            Pool::Linear => &mut self.linear[placement.index],
            Pool::Fallback => &mut self.fallback[placement.index],
        }
    }
}

/// Name → index map for one pool. `taken` holds names already used by the
/// other pool.
fn index_pool(
    pool: &[State],
    taken: &HashMap<StateId, usize>,
) -> Result<HashMap<StateId, usize>, MachineError> {
    let mut index = HashMap::with_capacity(pool.len());
    for (position, state) in pool.iter().enumerate() {
        if taken.contains_key(state.id()) || index.insert(state.id().clone(), position).is_some() {
            return Err(MachineError::DuplicateState {
                name: state.id().clone(),
            });
        }
    }
    Ok(index)
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", self.current_state())
            .field("running", &self.running)
            .field("entered", &self.entered)
            .field("ticks", &self.ticks)
            .field("linear", &self.linear)
            .field("fallback", &self.fallback)
            .finish()
    }
}
