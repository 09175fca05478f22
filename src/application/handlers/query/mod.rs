//! Lock-free read handlers.

mod get_auction_state;
mod get_viewer_count;

pub use get_auction_state::{AuctionState, GetAuctionStateHandler, GetAuctionStateQuery};
pub use get_viewer_count::{GetViewerCountHandler, GetViewerCountQuery};
