//! Errors raised by the engine.

use crate::core::StateId;
use thiserror::Error;

/// Logic errors in an authored graph.
///
/// None of these are transient: the engine never retries or skips past them,
/// it hands them to the caller on the tick they are detected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MachineError {
    #[error("Invalid state '{name}': no linear or fallback state has this name")]
    InvalidState { name: StateId },

    #[error("Transition fired from '{from}' but there is no next state in linear order")]
    TransitionWithoutNextState { from: StateId },

    #[error("State machine has no initial state: add at least one non-fallback state")]
    EmptyGraph,

    #[error("State '{name}' is declared more than once")]
    DuplicateState { name: StateId },
}
