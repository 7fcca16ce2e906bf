//! The execution engine.
//!
//! [`StateMachine`] owns the compiled graph and is stepped once per control
//! loop iteration. All work happens synchronously inside
//! [`StateMachine::update`]; the engine never blocks, spawns or retries.

mod error;
mod machine;

pub use error::MachineError;
pub use machine::{MachineOptions, MachineStatus, Pool, StateMachine};
