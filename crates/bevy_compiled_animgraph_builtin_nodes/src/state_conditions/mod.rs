//! Transition conditions. They are compiled inside a conduit and read the timing of the state
//! the transition leaves.

mod state_completed;
mod time_condition;

pub use state_completed::*;
pub use time_condition::*;
