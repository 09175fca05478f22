//! Auction aggregate: lifecycle, rules and the single active-player slot.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Amount, AuctionId, BidderId, Caller, PlayerId, StateMachine, Timestamp, UserId,
    ValidationError,
};

use super::{AuctionError, AuctionRules, AuctionStatus};

pub const MAX_NAME_LENGTH: usize = 200;

/// The most recent committed sale; the only one that may be undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub player_id: PlayerId,
    pub bidder_id: BidderId,
    pub amount: Amount,
    pub sold_at: Timestamp,
}

/// # Invariants
///
/// - `active_player` is set iff exactly that player is IN_BIDDING
/// - rules change only in DRAFT
/// - COMPLETED auctions accept no further mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    id: AuctionId,
    owner_id: UserId,
    name: String,
    status: AuctionStatus,
    rules: AuctionRules,
    registration_open: bool,
    published: bool,
    active_player: Option<PlayerId>,
    last_sale: Option<SaleRecord>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Auction {
    /// Creates a DRAFT auction with registration open.
    pub fn new(
        id: AuctionId,
        owner_id: UserId,
        name: impl Into<String>,
        rules: AuctionRules,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        Self::validate_name(&name)?;
        rules.validate()?;

        let now = Timestamp::now();
        Ok(Self {
            id,
            owner_id,
            name,
            status: AuctionStatus::Draft,
            rules,
            registration_open: true,
            published: false,
            active_player: None,
            last_sale: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an auction from storage without validation.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: AuctionId,
        owner_id: UserId,
        name: String,
        status: AuctionStatus,
        rules: AuctionRules,
        registration_open: bool,
        published: bool,
        active_player: Option<PlayerId>,
        last_sale: Option<SaleRecord>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            owner_id,
            name,
            status,
            rules,
            registration_open,
            published,
            active_player,
            last_sale,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &AuctionId {
        &self.id
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> AuctionStatus {
        self.status
    }

    pub fn rules(&self) -> &AuctionRules {
        &self.rules
    }

    pub fn registration_open(&self) -> bool {
        self.registration_open
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    /// The player currently IN_BIDDING, if any.
    pub fn active_player(&self) -> Option<PlayerId> {
        self.active_player
    }

    pub fn last_sale(&self) -> Option<&SaleRecord> {
        self.last_sale.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    /// Admin operations require the owning administrator.
    pub fn authorize_admin(&self, caller: &Caller) -> Result<(), AuctionError> {
        if caller.is_admin() && self.is_owned_by(&caller.user_id) {
            Ok(())
        } else {
            Err(AuctionError::forbidden(format!(
                "user {} does not administer auction {}",
                caller.user_id, self.id
            )))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn ensure_mutable(&self) -> Result<(), AuctionError> {
        if self.status == AuctionStatus::Completed {
            return Err(AuctionError::AuctionCompleted);
        }
        Ok(())
    }

    pub(crate) fn transition_to(
        &mut self,
        target: AuctionStatus,
        now: Timestamp,
    ) -> Result<(), AuctionError> {
        self.ensure_mutable()?;
        let current = self.status;
        self.status = current.transition_to(target).map_err(|_| {
            AuctionError::invalid_state(format!(
                "auction cannot move from {} to {}",
                current, target
            ))
        })?;
        if target == AuctionStatus::Live {
            self.published = true;
        }
        self.updated_at = now;
        Ok(())
    }

    pub(crate) fn replace_rules(
        &mut self,
        rules: AuctionRules,
        now: Timestamp,
    ) -> Result<(), AuctionError> {
        if self.status != AuctionStatus::Draft {
            return Err(AuctionError::invalid_state(format!(
                "rules can only change in DRAFT, auction is {}",
                self.status
            )));
        }
        rules.validate()?;
        self.rules = rules;
        self.updated_at = now;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Active player slot
    // ─────────────────────────────────────────────────────────────────────────

    /// Compare-and-swap on the active slot: empty -> `player_id`.
    pub(crate) fn claim_active_player(
        &mut self,
        player_id: PlayerId,
        now: Timestamp,
    ) -> Result<(), AuctionError> {
        match self.active_player {
            None => {
                self.active_player = Some(player_id);
                self.updated_at = now;
                Ok(())
            }
            Some(current) if current == player_id => Ok(()),
            Some(current) => Err(AuctionError::invalid_state(format!(
                "player {} is already in bidding",
                current
            ))),
        }
    }

    /// Clears the slot if it still holds `player_id`.
    pub(crate) fn release_active_player(&mut self, player_id: PlayerId, now: Timestamp) {
        if self.active_player == Some(player_id) {
            self.active_player = None;
            self.updated_at = now;
        }
    }

    pub(crate) fn record_sale(&mut self, sale: SaleRecord) {
        self.updated_at = sale.sold_at;
        self.last_sale = Some(sale);
    }

    /// Takes the undo window; a second undo finds it empty.
    pub(crate) fn take_last_sale(&mut self, now: Timestamp) -> Option<SaleRecord> {
        let sale = self.last_sale.take();
        if sale.is_some() {
            self.updated_at = now;
        }
        sale
    }

    fn validate_name(name: &str) -> Result<(), ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if trimmed.len() > MAX_NAME_LENGTH {
            return Err(ValidationError::out_of_range(
                "name",
                1,
                MAX_NAME_LENGTH as i64,
                trimmed.len() as i64,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserId {
        UserId::new("admin-1").unwrap()
    }

    fn draft() -> Auction {
        Auction::new(AuctionId::new(), owner(), "Premier Draft", AuctionRules::default()).unwrap()
    }

    #[test]
    fn new_auction_is_unpublished_draft() {
        let auction = draft();
        assert_eq!(auction.status(), AuctionStatus::Draft);
        assert!(!auction.is_published());
        assert!(auction.registration_open());
        assert_eq!(auction.active_player(), None);
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = Auction::new(AuctionId::new(), owner(), "  ", AuctionRules::default());
        assert!(matches!(result, Err(ValidationError::EmptyField { .. })));
    }

    #[test]
    fn going_live_marks_published() {
        let mut auction = draft();
        auction.transition_to(AuctionStatus::Live, Timestamp::now()).unwrap();
        assert!(auction.is_published());
    }

    #[test]
    fn illegal_transition_is_invalid_state() {
        let mut auction = draft();
        let err = auction
            .transition_to(AuctionStatus::Paused, Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, AuctionError::InvalidState(_)));
    }

    #[test]
    fn completed_auction_rejects_everything() {
        let mut auction = draft();
        let now = Timestamp::now();
        auction.transition_to(AuctionStatus::Live, now).unwrap();
        auction.transition_to(AuctionStatus::Completed, now).unwrap();
        assert_eq!(
            auction.transition_to(AuctionStatus::Live, now),
            Err(AuctionError::AuctionCompleted)
        );
    }

    #[test]
    fn rules_are_frozen_after_publish() {
        let mut auction = draft();
        let now = Timestamp::now();
        let rules = AuctionRules {
            countdown_seconds: 10,
            ..Default::default()
        };
        auction.replace_rules(rules.clone(), now).unwrap();
        assert_eq!(auction.rules().countdown_seconds, 10);

        auction.transition_to(AuctionStatus::Live, now).unwrap();
        assert!(matches!(
            auction.replace_rules(rules, now),
            Err(AuctionError::InvalidState(_))
        ));
    }

    #[test]
    fn active_slot_is_compare_and_swap() {
        let mut auction = draft();
        let now = Timestamp::now();
        let first = PlayerId::new();
        let second = PlayerId::new();

        auction.claim_active_player(first, now).unwrap();
        assert!(auction.claim_active_player(first, now).is_ok());
        assert!(auction.claim_active_player(second, now).is_err());

        auction.release_active_player(second, now);
        assert_eq!(auction.active_player(), Some(first));
        auction.release_active_player(first, now);
        assert_eq!(auction.active_player(), None);
    }

    #[test]
    fn last_sale_is_taken_once() {
        let mut auction = draft();
        let sale = SaleRecord {
            player_id: PlayerId::new(),
            bidder_id: BidderId::new(),
            amount: Amount::new(600),
            sold_at: Timestamp::now(),
        };
        auction.record_sale(sale.clone());
        assert_eq!(auction.take_last_sale(Timestamp::now()), Some(sale));
        assert_eq!(auction.take_last_sale(Timestamp::now()), None);
    }

    #[test]
    fn only_owning_admin_is_authorized() {
        let auction = draft();
        assert!(auction.authorize_admin(&Caller::admin(owner())).is_ok());
        assert!(auction
            .authorize_admin(&Caller::admin(UserId::new("other").unwrap()))
            .is_err());
        assert!(auction.authorize_admin(&Caller::bidder(owner())).is_err());
    }
}
