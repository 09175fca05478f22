//! Read model of a whole floor, served to websocket clients on connect and
//! to admin dashboards.

use serde::Serialize;

use crate::domain::auction::Auction;
use crate::domain::bidder::Bidder;
use crate::domain::foundation::Amount;
use crate::domain::player::Player;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderStanding {
    #[serde(flatten)]
    pub bidder: Bidder,
    pub remaining_purse: Amount,
    pub players_won: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorView {
    pub auction: Auction,
    pub players: Vec<Player>,
    pub bidders: Vec<BidderStanding>,
    /// Lowest acceptable bid on the player in bidding, if any.
    pub next_minimum_bid: Option<Amount>,
    pub version: u64,
}
