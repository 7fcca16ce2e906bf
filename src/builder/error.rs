//! Build errors for the state machine builder.

use crate::core::StateId;
use crate::engine::MachineError;
use crate::graph::GraphViolation;
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{call}() called before any state was declared. Call .state(name) first")]
    NoOpenState { call: &'static str },

    #[error("with_min_time() called on state '{state}' before any transition was added")]
    NoOpenTransition { state: StateId },

    #[error(transparent)]
    Machine(#[from] MachineError),

    #[error("Graph validation failed with {} violation(s)", .0.len())]
    Invalid(Vec<GraphViolation>),
}
