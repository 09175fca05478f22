//! Stateless bid validation.
//!
//! The validator reads the auction, the player and the bidder and answers
//! accept or reject. It never mutates anything; ties between concurrent bids
//! are settled by whichever reaches the per-auction lock first.

use thiserror::Error;

use crate::domain::auction::{Auction, AuctionStatus, AuctionRules};
use crate::domain::bidder::Bidder;
use crate::domain::foundation::{Amount, BidderId, PlayerId};
use crate::domain::player::{Player, PlayerStatus};

/// Everything the validator looks at for one proposed bid.
#[derive(Debug, Clone, Copy)]
pub struct BidContext<'a> {
    pub auction: &'a Auction,
    pub player: &'a Player,
    /// `None` when the bidder is not registered in this auction.
    pub bidder: Option<&'a Bidder>,
    /// Players the bidder has already won in this auction.
    pub players_won: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidDecision {
    /// Becomes the new current bid.
    Accept,
    /// Resubmission of the bid that is already current; nothing to do.
    AlreadyCurrent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidRejection {
    #[error("auction is {status}, not LIVE")]
    AuctionNotLive { status: AuctionStatus },

    #[error("player {player_id} is {status}, not IN_BIDDING")]
    PlayerNotInBidding {
        player_id: PlayerId,
        status: PlayerStatus,
    },

    #[error("bidder {bidder_id} is not registered in this auction")]
    BidderNotInAuction { bidder_id: BidderId },

    #[error("bid of {amount} is below the minimum of {minimum}")]
    AmountBelowMinimumIncrement { amount: Amount, minimum: Amount },

    #[error("bid of {amount} exceeds remaining purse {remaining}")]
    InsufficientPurse { amount: Amount, remaining: Amount },

    #[error("bidder already has {won} players; the team limit is {max}")]
    TeamSizeExceeded { won: u32, max: u32 },
}

/// Lowest acceptable amount: current bid plus increment, or the base price
/// when nobody has bid. `None` when the sum overflows.
pub fn minimum_acceptable(rules: &AuctionRules, player: &Player) -> Option<Amount> {
    match player.current_bid() {
        Some(current) => current.amount.checked_add(rules.min_bid_increment),
        None => Some(player.base_price()),
    }
}

/// Checks, in order: auction live, player in bidding, bidder registered,
/// minimum increment, purse, team size.
pub fn validate_bid(
    ctx: BidContext<'_>,
    bidder_id: &BidderId,
    amount: Amount,
) -> Result<BidDecision, BidRejection> {
    let status = ctx.auction.status();
    if !status.accepts_bids() {
        return Err(BidRejection::AuctionNotLive { status });
    }

    if ctx.player.status() != PlayerStatus::InBidding {
        return Err(BidRejection::PlayerNotInBidding {
            player_id: ctx.player.id(),
            status: ctx.player.status(),
        });
    }

    let bidder = match ctx.bidder {
        Some(bidder) if bidder.auction_id() == ctx.auction.id() => bidder,
        _ => {
            return Err(BidRejection::BidderNotInAuction {
                bidder_id: *bidder_id,
            })
        }
    };

    if let Some(current) = ctx.player.current_bid() {
        if current.is_same_offer(bidder_id, amount) {
            return Ok(BidDecision::AlreadyCurrent);
        }
    }

    let rules = ctx.auction.rules();
    match minimum_acceptable(rules, ctx.player) {
        Some(minimum) if amount >= minimum => {}
        minimum => {
            return Err(BidRejection::AmountBelowMinimumIncrement {
                amount,
                minimum: minimum.unwrap_or(Amount::new(u64::MAX)),
            })
        }
    }

    if rules.purse_enforcement {
        let remaining = bidder.remaining_purse();
        if amount > remaining {
            return Err(BidRejection::InsufficientPurse { amount, remaining });
        }
    }

    if ctx.players_won >= rules.max_team_size {
        return Err(BidRejection::TeamSizeExceeded {
            won: ctx.players_won,
            max: rules.max_team_size,
        });
    }

    Ok(BidDecision::Accept)
}
