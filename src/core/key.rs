//! State identity.
//!
//! Every state in a graph is identified by a [`StateId`]. Callers usually name
//! states with strings or with their own enums; both go through the
//! [`StateKey`] trait and collapse to the same canonical string key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity of a state inside a graph.
///
/// Builder-generated states (wait states) have no caller-visible name, so they
/// get their own variant instead of sharing a placeholder name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateId {
    /// A state declared by the caller under this name.
    Named(String),
    /// A state generated by the builder, numbered in declaration order.
    Anonymous(u32),
}

impl StateId {
    /// Create a named identifier from any state key.
    pub fn named(key: impl StateKey) -> Self {
        StateId::Named(key.key().to_string())
    }

    /// The caller-visible name, if this state has one.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            StateId::Named(name) => Some(name),
            StateId::Anonymous(_) => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, StateId::Anonymous(_))
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateId::Named(name) => f.write_str(name),
            StateId::Anonymous(n) => write!(f, "<anonymous #{n}>"),
        }
    }
}

/// Caller-side identifier for a state.
///
/// Implemented for string types out of the box. Enums get an implementation
/// from the [`state_key!`](crate::state_key) macro, which maps each variant to
/// its own name, so `Intake::Extend` and `"Extend"` address the same state.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{StateId, StateKey};
///
/// #[derive(Clone, Copy)]
/// enum Arm {
///     Raise,
///     Lower,
/// }
///
/// impl StateKey for Arm {
///     fn key(&self) -> &str {
///         match self {
///             Self::Raise => "Raise",
///             Self::Lower => "Lower",
///         }
///     }
/// }
///
/// assert_eq!(StateId::named(Arm::Raise), StateId::named("Raise"));
/// assert_eq!(Arm::Lower.key(), "Lower");
/// ```
pub trait StateKey {
    /// The canonical string key of this state.
    fn key(&self) -> &str;
}

impl StateKey for str {
    fn key(&self) -> &str {
        self
    }
}

impl StateKey for String {
    fn key(&self) -> &str {
        self.as_str()
    }
}

impl<K: StateKey + ?Sized> StateKey for &K {
    fn key(&self) -> &str {
        (**self).key()
    }
}
