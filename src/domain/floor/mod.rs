//! Floor module - one auction, its players and bidders as a single
//! consistency unit, and the events its operations raise.

mod events;
#[allow(clippy::module_inception)]
mod floor;
mod view;

pub use events::{
    AuctionEnded, AuctionEvent, AuctionPaused, AuctionResumed, AuctionStarted, BidUndo, NewBid,
    NewPlayer, PlayerSold, PlayerUnsold, PursesRecomputed, SaleUndo,
};
pub use floor::{AuctionFloor, BidReceipt, BidWithdrawal, FloorChanges, SaleTerms, SaleUndone};
pub use view::{BidderStanding, FloorView};
