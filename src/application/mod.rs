//! Application layer - the engine, its handlers and the background
//! coordinators.
//!
//! Command handlers serialize per auction through the [`FloorExecutor`].
//! Timers and presence run on their own cadences and only publish.

pub mod engine;
pub mod executor;
pub mod gateway;
pub mod handlers;
pub mod presence;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::AuctionEngine;
pub use executor::{AuctionLocks, Committed, FloorExecutor};
pub use gateway::BroadcastGateway;
pub use handlers::{AuctionState, LifecycleResult, MarkSoldCommand};
pub use presence::{PresenceService, PresenceSweeper, SweepReport};
pub use timer::{TimerCoordinator, TimerExpiry};
