//! Bidder entity: a registered team and its purse.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Amount, AuctionId, BidderId, UserId, ValidationError};

/// # Invariants
///
/// - `remaining_purse() == total_purse - spent`, floored at zero
/// - `spent` moves only through the purse ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bidder {
    id: BidderId,
    auction_id: AuctionId,
    /// Account allowed to bid for this team, if any.
    user_id: Option<UserId>,
    name: String,
    team_name: Option<String>,
    total_purse: Amount,
    spent: Amount,
}

impl Bidder {
    pub fn new(
        id: BidderId,
        auction_id: AuctionId,
        name: impl Into<String>,
        team_name: Option<String>,
        total_purse: Amount,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("bidder_name"));
        }
        Ok(Self {
            id,
            auction_id,
            user_id: None,
            name,
            team_name: team_name.filter(|team| !team.trim().is_empty()),
            total_purse,
            spent: Amount::ZERO,
        })
    }

    /// Links the account that bids for this team.
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Rebuilds a bidder from storage without validation.
    pub fn reconstitute(
        id: BidderId,
        auction_id: AuctionId,
        user_id: Option<UserId>,
        name: String,
        team_name: Option<String>,
        total_purse: Amount,
        spent: Amount,
    ) -> Self {
        Self {
            id,
            auction_id,
            user_id,
            name,
            team_name,
            total_purse,
            spent,
        }
    }

    pub fn id(&self) -> BidderId {
        self.id
    }

    pub fn auction_id(&self) -> &AuctionId {
        &self.auction_id
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn team_name(&self) -> Option<&str> {
        self.team_name.as_deref()
    }

    pub fn total_purse(&self) -> Amount {
        self.total_purse
    }

    pub fn spent(&self) -> Amount {
        self.spent
    }

    pub fn remaining_purse(&self) -> Amount {
        self.total_purse.saturating_sub(self.spent)
    }

    /// The account bids for this team.
    pub fn is_operated_by(&self, user_id: &UserId) -> bool {
        self.user_id.as_ref() == Some(user_id)
    }

    pub(crate) fn set_spent(&mut self, spent: Amount) {
        self.spent = spent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bidder(total: u64) -> Bidder {
        Bidder::new(
            BidderId::new(),
            AuctionId::new(),
            "Asha",
            Some("Mumbai Mariners".to_string()),
            Amount::new(total),
        )
        .unwrap()
    }

    #[test]
    fn remaining_starts_at_total() {
        let bidder = bidder(10_000);
        assert_eq!(bidder.remaining_purse(), Amount::new(10_000));
        assert_eq!(bidder.spent(), Amount::ZERO);
    }

    #[test]
    fn remaining_floors_at_zero_when_overspent() {
        let mut bidder = bidder(1_000);
        bidder.set_spent(Amount::new(1_500));
        assert_eq!(bidder.remaining_purse(), Amount::ZERO);
    }

    #[test]
    fn blank_team_name_is_dropped() {
        let bidder = Bidder::new(
            BidderId::new(),
            AuctionId::new(),
            "Ravi",
            Some("  ".to_string()),
            Amount::new(1),
        )
        .unwrap();
        assert_eq!(bidder.team_name(), None);
    }

    #[test]
    fn operator_is_the_linked_user() {
        let user = UserId::new("team-owner").unwrap();
        let bidder = bidder(100).with_user(user.clone());
        assert!(bidder.is_operated_by(&user));
        assert!(!bidder.is_operated_by(&UserId::new("someone").unwrap()));
    }
}
