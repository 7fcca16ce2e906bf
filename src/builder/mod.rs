//! Builder API for ergonomic state machine construction.
//!
//! The builder assembles [`State`](crate::graph::State) records from a fluent
//! call sequence and hands them to the engine. It adds no runtime behaviour
//! of its own beyond ordering each state's deferred callbacks by delay.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
