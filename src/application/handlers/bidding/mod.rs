//! Bid command handlers.

mod place_bid;
mod undo_bid;

pub use place_bid::{PlaceBidCommand, PlaceBidHandler, PlaceBidResult};
pub use undo_bid::{UndoBidCommand, UndoBidHandler, UndoBidResult};
