//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - in-process store, presence, timer bus and recording
//!   broadcaster (tests, single-node runs)
//! - `postgres` - the durable auction record store
//! - `redis` - cross-server broadcast, timer bus, relay and shared presence
//! - `websocket` - live feed rooms and the axum upgrade handler

pub mod memory;
pub mod postgres;
pub mod redis;
pub mod websocket;

pub use memory::{
    InMemoryAuctionStore, InMemoryPresenceStore, InMemoryTimerBus, RecordingBroadcaster,
};
pub use postgres::PostgresAuctionStore;
pub use redis::{RedisBroadcaster, RedisPresenceStore, RedisRelay, RedisTimerBus};
pub use websocket::{live_feed_router, LiveFeedState, RoomManager};
