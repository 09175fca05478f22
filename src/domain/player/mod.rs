//! Player module - the sale state machine and accepted bids.

mod bid;
mod entity;
mod status;

pub use bid::Bid;
pub use entity::{Player, SaleReversal};
pub use status::PlayerStatus;
