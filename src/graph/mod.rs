//! The state graph: [`State`] records, their outgoing [`Transition`]s and an
//! opt-in static [`validate`] pass.

mod state;
mod transition;
mod validate;

pub use state::State;
pub use transition::Transition;
pub use validate::{validate, GraphViolation};
