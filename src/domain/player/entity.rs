//! Player entity: the item a sale is run for.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::domain::auction::AuctionError;
use crate::domain::foundation::{
    Amount, AuctionId, BidderId, PlayerId, StateMachine, ValidationError,
};

use super::{Bid, PlayerStatus};

/// Result of reopening a sold player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleReversal {
    pub bidder_id: BidderId,
    pub amount: Amount,
    /// Bid that is current again after the reversal.
    pub restored_bid: Option<Bid>,
}

/// # Invariants
///
/// - `sold_to` and `sold_price` are set iff `status` is SOLD
/// - `current_bid` is the last entry of `bid_history` while IN_BIDDING
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    id: PlayerId,
    auction_id: AuctionId,
    name: String,
    base_price: Amount,
    icon: bool,
    attributes: Map<String, JsonValue>,
    status: PlayerStatus,
    sold_to: Option<BidderId>,
    sold_price: Option<Amount>,
    current_bid: Option<Bid>,
    bid_history: Vec<Bid>,
}

impl Player {
    pub fn new(
        id: PlayerId,
        auction_id: AuctionId,
        name: impl Into<String>,
        base_price: Amount,
        icon: bool,
        attributes: Map<String, JsonValue>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("player_name"));
        }
        Ok(Self {
            id,
            auction_id,
            name,
            base_price,
            icon,
            attributes,
            status: PlayerStatus::Available,
            sold_to: None,
            sold_price: None,
            current_bid: None,
            bid_history: Vec::new(),
        })
    }

    /// Rebuilds a player from storage without validation.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: PlayerId,
        auction_id: AuctionId,
        name: String,
        base_price: Amount,
        icon: bool,
        attributes: Map<String, JsonValue>,
        status: PlayerStatus,
        sold_to: Option<BidderId>,
        sold_price: Option<Amount>,
        bid_history: Vec<Bid>,
    ) -> Self {
        let current_bid = bid_history.last().cloned();
        Self {
            id,
            auction_id,
            name,
            base_price,
            icon,
            attributes,
            status,
            sold_to,
            sold_price,
            current_bid,
            bid_history,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn auction_id(&self) -> &AuctionId {
        &self.auction_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_price(&self) -> Amount {
        self.base_price
    }

    pub fn is_icon(&self) -> bool {
        self.icon
    }

    pub fn attributes(&self) -> &Map<String, JsonValue> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&JsonValue> {
        self.attributes.get(key)
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn sold_to(&self) -> Option<BidderId> {
        self.sold_to
    }

    pub fn sold_price(&self) -> Option<Amount> {
        self.sold_price
    }

    pub fn current_bid(&self) -> Option<&Bid> {
        self.current_bid.as_ref()
    }

    pub fn bid_history(&self) -> &[Bid] {
        &self.bid_history
    }

    /// Sold to `bidder_id`.
    pub fn is_won_by(&self, bidder_id: &BidderId) -> bool {
        self.status == PlayerStatus::Sold && self.sold_to.as_ref() == Some(bidder_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sale state machine
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn start_bidding(&mut self) -> Result<(), AuctionError> {
        let (id, current) = (self.id, self.status);
        self.status = current.transition_to(PlayerStatus::InBidding).map_err(|_| {
            AuctionError::invalid_state(format!(
                "player {} is {} and cannot enter bidding",
                id, current
            ))
        })?;
        self.current_bid = None;
        self.bid_history.clear();
        Ok(())
    }

    pub(crate) fn accept_bid(&mut self, bid: Bid) -> Result<(), AuctionError> {
        self.ensure_in_bidding()?;
        self.bid_history.push(bid.clone());
        self.current_bid = Some(bid);
        Ok(())
    }

    /// Drops the latest bid; the one before it becomes current.
    ///
    /// Returns the withdrawn bid.
    pub(crate) fn withdraw_last_bid(&mut self) -> Result<Bid, AuctionError> {
        self.ensure_in_bidding()?;
        let withdrawn = self
            .bid_history
            .pop()
            .ok_or(AuctionError::NoActiveBid(self.id))?;
        self.current_bid = self.bid_history.last().cloned();
        Ok(withdrawn)
    }

    pub(crate) fn mark_sold(&mut self, bidder_id: BidderId, amount: Amount) -> Result<(), AuctionError> {
        self.ensure_in_bidding()?;
        self.status = PlayerStatus::Sold;
        self.sold_to = Some(bidder_id);
        self.sold_price = Some(amount);
        Ok(())
    }

    pub(crate) fn mark_unsold(&mut self) -> Result<(), AuctionError> {
        self.ensure_in_bidding()?;
        self.status = PlayerStatus::Unsold;
        self.current_bid = None;
        Ok(())
    }

    /// SOLD -> IN_BIDDING, keeping the bid history so the winning bid is
    /// current again.
    pub(crate) fn revert_sale(&mut self) -> Result<SaleReversal, AuctionError> {
        let (bidder_id, amount) = match (self.status, self.sold_to, self.sold_price) {
            (PlayerStatus::Sold, Some(bidder_id), Some(amount)) => (bidder_id, amount),
            _ => {
                return Err(AuctionError::nothing_to_undo(format!(
                    "player {} is {}, not SOLD",
                    self.id, self.status
                )))
            }
        };
        self.status = PlayerStatus::InBidding;
        self.sold_to = None;
        self.sold_price = None;
        self.current_bid = self.bid_history.last().cloned();
        Ok(SaleReversal {
            bidder_id,
            amount,
            restored_bid: self.current_bid.clone(),
        })
    }

    fn ensure_in_bidding(&self) -> Result<(), AuctionError> {
        if self.status != PlayerStatus::InBidding {
            return Err(AuctionError::PlayerNotInBidding {
                player_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}
