//! Core vocabulary shared by the graph, the engine and the builder:
//! - State identity via [`StateId`] and the [`StateKey`] trait
//! - [`Condition`] and [`Action`] callbacks, combined into [`Guard`]s
//! - Bounded history of committed state changes

mod guard;
mod history;
mod key;

pub(crate) use guard::run_all;
pub use guard::{Action, BoxedAction, BoxedCondition, Condition, Guard};
pub use history::{StateChange, StateHistory, DEFAULT_HISTORY_CAPACITY};
pub use key::{StateId, StateKey};
