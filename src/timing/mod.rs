//! Time-gated building blocks.
//!
//! - [`TimedCondition`]: true once a duration has passed since arming
//! - [`DeferredCallback`]: one-shot action fired after a delay
//! - [`Clock`]: the monotonic time source both of them read

mod clock;
mod deferred;
mod timed;

pub use clock::{system_clock, Clock, FakeClock, SystemClock};
pub use deferred::DeferredCallback;
pub use timed::TimedCondition;
