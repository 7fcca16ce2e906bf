//! Tickstate: a tick-driven finite state machine engine
//!
//! Tickstate drives cyclic control programs, such as a robot's per-loop
//! control code. A state graph is assembled once, then stepped by the caller
//! once per loop iteration. Each tick the engine decides whether to run entry,
//! loop or exit logic and whether to move to another state.
//!
//! # Core Concepts
//!
//! - **State**: a named node with entry, exit and loop actions, deferred
//!   callbacks and ordered outgoing transitions
//! - **Transition**: a condition plus an optional explicit target; without a
//!   target it leads to the next state in declaration order
//! - **Fallback states**: reachable only through explicit targets
//! - **Timers**: time-gated transitions, minimum dwell times and one-shot
//!   deferred callbacks, all read from a pluggable monotonic [`Clock`](timing::Clock)
//!
//! # Example
//!
//! ```rust
//! use tickstate::builder::StateMachineBuilder;
//! use tickstate::state_key;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! state_key! {
//!     enum Intake {
//!         Extend,
//!         Grab,
//!         Stow,
//!         Jammed,
//!     }
//! }
//!
//! let sensor = Arc::new(AtomicBool::new(true));
//! let touched = Arc::clone(&sensor);
//!
//! let mut machine = StateMachineBuilder::new()
//!     .state(Intake::Extend)
//!     .on_enter(|| println!("extending"))
//!     .transition(move || touched.load(Ordering::SeqCst))
//!     .state(Intake::Grab)
//!     .transition_timed_to(Duration::from_secs(3), Intake::Jammed)
//!     .transition(|| true)
//!     .state(Intake::Stow)
//!     .fallback_state(Intake::Jammed)
//!     .on_enter(|| println!("jammed"))
//!     .build()
//!     .unwrap();
//!
//! machine.start();
//! while machine.is_running() {
//!     machine.update().unwrap();
//! }
//! assert!(machine.is_in(Intake::Stow));
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod graph;
pub mod timing;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use self::core::{Action, Condition, Guard, StateId, StateKey};
pub use engine::{MachineError, StateMachine};
pub use graph::{State, Transition};
