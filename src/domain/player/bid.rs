//! A single accepted bid.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Amount, BidderId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub bidder_id: BidderId,
    pub amount: Amount,
    pub placed_at: Timestamp,
}

impl Bid {
    pub fn new(bidder_id: BidderId, amount: Amount, placed_at: Timestamp) -> Self {
        Self {
            bidder_id,
            amount,
            placed_at,
        }
    }

    /// Same bidder and amount, regardless of when it arrived.
    pub fn is_same_offer(&self, bidder_id: &BidderId, amount: Amount) -> bool {
        &self.bidder_id == bidder_id && self.amount == amount
    }
}
