//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the engine and the outside world. Adapters implement these ports.
//!
//! - `AuctionStore` - Authoritative auction records, versioned commits
//! - `Broadcaster` - Best-effort fan-out of event messages to channels
//! - `PresenceStore` - Viewer sessions and counts per auction
//! - `TimerBus` - Countdown commands shared between engine instances

mod auction_store;
mod broadcaster;
mod presence_store;
mod timer_bus;

pub use auction_store::AuctionStore;
pub use broadcaster::{Broadcaster, Channel};
pub use presence_store::{PresenceChange, PresenceStore, SweepOutcome};
pub use timer_bus::TimerBus;
