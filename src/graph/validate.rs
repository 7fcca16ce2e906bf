//! Static checks over a state list.
//!
//! The engine resolves transition targets lazily, so a mistyped target only
//! shows up when that transition fires, possibly minutes into a run. This
//! module finds those mistakes up front, reporting every violation at once
//! through Stillwater's `Validation` instead of stopping at the first.

use super::state::State;
use crate::core::StateId;
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Problems detectable without running the graph.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphViolation {
    #[error("State '{name}' is declared more than once")]
    DuplicateName { name: StateId },

    #[error("Transition from '{from}' targets unknown state '{target}'")]
    UnknownTarget { from: StateId, target: StateId },

    #[error("Default transition from '{from}' has no next state: it is the last linear state")]
    DanglingDefault { from: StateId },

    #[error("Fallback state '{from}' has a transition without an explicit target")]
    FallbackWithoutTarget { from: StateId },

    #[error("Graph has no linear state to start from")]
    NoLinearState,
}

type Check = Validation<(), NonEmptyVec<GraphViolation>>;

/// Validate a state list, accumulating ALL violations.
///
/// # Example
///
/// ```rust
/// use tickstate::graph::{validate, GraphViolation, State, Transition};
/// use stillwater::validation::Validation;
///
/// let states = vec![
///     State::new("Start").transition(Transition::when(|| true).to("Nowhere")),
///     State::new("End").transition(Transition::when(|| true)),
/// ];
///
/// match validate(&states) {
///     Validation::Failure(errors) => assert_eq!(errors.len(), 2),
///     Validation::Success(_) => panic!("expected violations"),
/// }
/// ```
pub fn validate(states: &[State]) -> Validation<(), NonEmptyVec<GraphViolation>> {
    let mut checks: Vec<Check> = Vec::new();

    let mut names = HashSet::new();
    let mut duplicates = HashSet::new();
    for state in states {
        if !names.insert(state.id()) && duplicates.insert(state.id()) {
            checks.push(Validation::fail(GraphViolation::DuplicateName {
                name: state.id().clone(),
            }));
        }
    }

    let last_linear = states.iter().rev().find(|s| !s.is_fallback());
    if last_linear.is_none() {
        checks.push(Validation::fail(GraphViolation::NoLinearState));
    }

    for state in states {
        for transition in state.transitions() {
            let check = match transition.target() {
                Some(target) if !names.contains(target) => {
                    Validation::fail(GraphViolation::UnknownTarget {
                        from: state.id().clone(),
                        target: target.clone(),
                    })
                }
                Some(_) => Validation::success(()),
                None if state.is_fallback() => {
                    Validation::fail(GraphViolation::FallbackWithoutTarget {
                        from: state.id().clone(),
                    })
                }
                None if last_linear.is_some_and(|last| last.id() == state.id()) => {
                    Validation::fail(GraphViolation::DanglingDefault {
                        from: state.id().clone(),
                    })
                }
                None => Validation::success(()),
            };
            checks.push(check);
        }
    }

    Validation::all_vec(checks).map(|_| ())
}
