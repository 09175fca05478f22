//! Websocket live feed.
//!
//! ```text
//!   AuctionEngine ──publish──▶ RoomManager ◀──deliver── RedisRelay
//!                               │  (single server)        (multi server)
//!                               ▼
//!             Room: auction-{id}     Room: private-user-{id}
//!                               │
//!                               ▼
//!                   live_feed_handler (one per socket)
//! ```
//!
//! - [`messages`] - wire protocol
//! - [`rooms`] - per-channel fan-out, itself a `Broadcaster`
//! - [`handler`] - axum upgrade handler and router

pub mod handler;
pub mod messages;
pub mod rooms;

pub use handler::{live_feed_handler, live_feed_router, LiveFeedParams, LiveFeedState};
pub use messages::{
    ClientMessage, ConnectedMessage, ErrorMessage, PongMessage, ServerMessage,
};
pub use rooms::{ClientId, RoomManager};
