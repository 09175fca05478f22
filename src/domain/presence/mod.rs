//! Presence module - viewer sessions and the count broadcast.

mod events;
mod roster;

pub use events::ViewerCountUpdate;
pub use roster::{PresenceRoster, ViewerSession};
