//! State change history.
//!
//! The engine keeps a bounded log of committed transitions. A control loop
//! runs indefinitely, so only the most recent changes are retained.

use super::key::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of changes kept by a [`StateHistory`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Record of a single committed state change.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{StateChange, StateId};
/// use chrono::Utc;
///
/// let change = StateChange {
///     from: StateId::named("Extend"),
///     to: StateId::named("Retract"),
///     timestamp: Utc::now(),
///     tick: 12,
/// };
/// assert_eq!(change.to.to_string(), "Retract");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    /// The state being left
    pub from: StateId,
    /// The state being entered
    pub to: StateId,
    /// Wall-clock time of the commit, for diagnostics only
    pub timestamp: DateTime<Utc>,
    /// The tick on which the change was committed
    pub tick: u64,
}

/// Bounded, ordered history of state changes.
///
/// Once `capacity` changes are stored, recording a new one drops the oldest.
/// A capacity of zero disables recording.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{StateChange, StateHistory, StateId};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_capacity(2);
/// for (tick, (from, to)) in [("A", "B"), ("B", "C"), ("C", "A")].into_iter().enumerate() {
///     history.record(StateChange {
///         from: StateId::named(from),
///         to: StateId::named(to),
///         timestamp: Utc::now(),
///         tick: tick as u64,
///     });
/// }
///
/// let path: Vec<String> = history.get_path().iter().map(|id| id.to_string()).collect();
/// assert_eq!(path, vec!["B", "C", "A"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory {
    changes: VecDeque<StateChange>,
    capacity: usize,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHistory {
    /// Empty history with [`DEFAULT_HISTORY_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Empty history keeping at most `capacity` changes. Storage grows on
    /// demand, so `usize::MAX` keeps everything.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            changes: VecDeque::new(),
            capacity,
        }
    }

    /// Maximum number of retained changes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a change, evicting the oldest one when full.
    pub fn record(&mut self, change: StateChange) {
        if self.capacity == 0 {
            return;
        }
        // A deserialised history may hold more than `capacity` changes.
        while self.changes.len() >= self.capacity {
            self.changes.pop_front();
        }
        self.changes.push_back(change);
    }

    /// States traversed by the retained changes: the `from` of the oldest
    /// change, then the `to` of each change.
    pub fn get_path(&self) -> Vec<&StateId> {
        let mut path = Vec::with_capacity(self.changes.len() + 1);
        if let Some(first) = self.changes.front() {
            path.push(&first.from);
        }
        path.extend(self.changes.iter().map(|change| &change.to));
        path
    }

    /// Wall-clock time between the oldest and newest retained change.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.changes.front()?, self.changes.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn changes(&self) -> impl Iterator<Item = &StateChange> {
        self.changes.iter()
    }

    pub fn last(&self) -> Option<&StateChange> {
        self.changes.back()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }
}
