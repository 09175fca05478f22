//! Purse bookkeeping applied inside sale commit and undo.
//!
//! Every function here mutates a bidder copy that belongs to the floor being
//! committed, so a debit or credit is only ever persisted together with the
//! player status change that caused it.

use serde::Serialize;

use crate::domain::auction::AuctionError;
use crate::domain::bidder::Bidder;
use crate::domain::foundation::{Amount, BidderId};
use crate::domain::player::{Player, PlayerStatus};

/// One bidder whose stored spend disagreed with its sold players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurseAdjustment {
    pub bidder_id: BidderId,
    pub previous_spent: Amount,
    pub recomputed_spent: Amount,
    pub remaining_purse: Amount,
}

pub struct PurseLedger;

impl PurseLedger {
    /// Charges a sale to the bidder and returns the new remaining purse.
    ///
    /// Under enforcement the charge may not exceed what remains.
    pub fn debit(bidder: &mut Bidder, amount: Amount, enforce: bool) -> Result<Amount, AuctionError> {
        let remaining = bidder.remaining_purse();
        if enforce && amount > remaining {
            return Err(AuctionError::InsufficientPurse { amount, remaining });
        }
        bidder.set_spent(bidder.spent().saturating_add(amount));
        Ok(bidder.remaining_purse())
    }

    /// Returns a reversed sale to the bidder.
    ///
    /// Spend never drops below zero, so remaining never exceeds the total.
    pub fn credit(bidder: &mut Bidder, amount: Amount) -> Amount {
        bidder.set_spent(bidder.spent().saturating_sub(amount));
        bidder.remaining_purse()
    }

    /// Sum of sold prices of players won by `bidder_id`.
    pub fn spent_on<'a>(bidder_id: &BidderId, players: impl IntoIterator<Item = &'a Player>) -> Amount {
        players
            .into_iter()
            .filter(|player| player.is_won_by(bidder_id))
            .filter_map(Player::sold_price)
            .sum()
    }

    /// Recomputes every bidder's spend from SOLD players.
    ///
    /// Only bidders that changed are reported. Running it twice reports
    /// nothing the second time.
    pub fn reconcile<'a>(
        bidders: impl IntoIterator<Item = &'a mut Bidder>,
        players: &[Player],
    ) -> Vec<PurseAdjustment> {
        let sold: Vec<&Player> = players
            .iter()
            .filter(|player| player.status() == PlayerStatus::Sold)
            .collect();

        bidders
            .into_iter()
            .filter_map(|bidder| {
                let recomputed = Self::spent_on(&bidder.id(), sold.iter().copied());
                let previous = bidder.spent();
                if recomputed == previous {
                    return None;
                }
                bidder.set_spent(recomputed);
                Some(PurseAdjustment {
                    bidder_id: bidder.id(),
                    previous_spent: previous,
                    recomputed_spent: recomputed,
                    remaining_purse: bidder.remaining_purse(),
                })
            })
            .collect()
    }
}
