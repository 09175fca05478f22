//! Timer module - the pure countdown, its broadcasts and the versioned
//! commands that drive it.

mod countdown;
mod events;
mod signal;

pub use countdown::{Countdown, CountdownState, Tick};
pub use events::{TimerExpired, TimerUpdate};
pub use signal::{TimerCommand, TimerSignal};
