//! In-memory adapters for tests and single-process deployments.

mod auction_store;
mod broadcaster;
mod presence_store;
mod timer_bus;

pub use auction_store::InMemoryAuctionStore;
pub use broadcaster::RecordingBroadcaster;
pub use presence_store::InMemoryPresenceStore;
pub use timer_bus::InMemoryTimerBus;
