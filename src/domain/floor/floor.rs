//! The auction floor: one auction with its players and bidders, loaded,
//! mutated and committed as a single unit.
//!
//! Every state-changing engine operation is a method here. Methods validate
//! first and mutate only the in-memory copy; the caller commits the copy
//! with a version check or throws it away. A sale's purse debit and its
//! status change therefore land together or not at all.

use std::collections::BTreeSet;

use crate::domain::auction::{
    publish_violations, Auction, AuctionError, AuctionRules, AuctionStatus, SaleRecord,
};
use crate::domain::bidder::Bidder;
use crate::domain::bidding::{minimum_acceptable, validate_bid, BidContext, BidDecision};
use crate::domain::foundation::{
    Amount, BidderId, Caller, PlayerId, Role, Timestamp, ValidationError,
};
use crate::domain::player::{Bid, Player, PlayerStatus};
use crate::domain::purse::{PurseAdjustment, PurseLedger};

use super::events::*;
use super::view::{BidderStanding, FloorView};

/// Entities touched since load; the store writes only these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloorChanges {
    pub auction: bool,
    pub players: BTreeSet<PlayerId>,
    pub bidders: BTreeSet<BidderId>,
}

impl FloorChanges {
    pub fn is_empty(&self) -> bool {
        !self.auction && self.players.is_empty() && self.bidders.is_empty()
    }
}

/// How the admin wants a player sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleTerms {
    /// Must equal the current bid exactly.
    CurrentBid { bidder_id: BidderId, amount: Amount },
    /// Admin-supplied winner and price; no bid needs to match.
    Override { bidder_id: BidderId, amount: Amount },
}

impl SaleTerms {
    pub fn bidder_id(&self) -> BidderId {
        match self {
            SaleTerms::CurrentBid { bidder_id, .. } | SaleTerms::Override { bidder_id, .. } => {
                *bidder_id
            }
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            SaleTerms::CurrentBid { amount, .. } | SaleTerms::Override { amount, .. } => *amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidReceipt {
    pub bid: Bid,
    /// The bid was already current; nothing changed.
    pub duplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidWithdrawal {
    pub withdrawn: Bid,
    pub current: Option<Bid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleUndone {
    pub player_id: PlayerId,
    pub bidder_id: BidderId,
    pub amount: Amount,
    pub restored_bid: Option<Bid>,
    pub remaining_purse: Amount,
}

#[derive(Debug, Clone)]
pub struct AuctionFloor {
    auction: Auction,
    players: Vec<Player>,
    bidders: Vec<Bidder>,
    version: u64,
    changes: FloorChanges,
    events: Vec<AuctionEvent>,
}

impl AuctionFloor {
    /// Assembles a fresh floor at version 0.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if a player or bidder belongs to another auction
    pub fn new(
        auction: Auction,
        players: Vec<Player>,
        bidders: Vec<Bidder>,
    ) -> Result<Self, ValidationError> {
        let id = *auction.id();
        if let Some(player) = players.iter().find(|p| p.auction_id() != &id) {
            return Err(ValidationError::invalid_format(
                "players",
                format!("player {} belongs to another auction", player.id()),
            ));
        }
        if let Some(bidder) = bidders.iter().find(|b| b.auction_id() != &id) {
            return Err(ValidationError::invalid_format(
                "bidders",
                format!("bidder {} belongs to another auction", bidder.id()),
            ));
        }
        Ok(Self::restore(auction, players, bidders, 0))
    }

    /// Rebuilds a floor read from storage at `version`.
    pub fn restore(
        auction: Auction,
        players: Vec<Player>,
        bidders: Vec<Bidder>,
        version: u64,
    ) -> Self {
        Self {
            auction,
            players,
            bidders,
            version,
            changes: FloorChanges::default(),
            events: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn auction(&self) -> &Auction {
        &self.auction
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn bidders(&self) -> &[Bidder] {
        &self.bidders
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id() == player_id)
    }

    pub fn bidder(&self, bidder_id: &BidderId) -> Option<&Bidder> {
        self.bidders.iter().find(|b| &b.id() == bidder_id)
    }

    pub fn active_player(&self) -> Option<&Player> {
        self.auction
            .active_player()
            .and_then(|id| self.player(&id))
    }

    /// Version this floor was loaded at.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn changes(&self) -> &FloorChanges {
        &self.changes
    }

    pub fn pending_events(&self) -> &[AuctionEvent] {
        &self.events
    }

    pub fn players_won(&self, bidder_id: &BidderId) -> u32 {
        self.players.iter().filter(|p| p.is_won_by(bidder_id)).count() as u32
    }

    pub fn view(&self) -> FloorView {
        FloorView {
            auction: self.auction.clone(),
            players: self.players.clone(),
            bidders: self
                .bidders
                .iter()
                .map(|bidder| BidderStanding {
                    bidder: bidder.clone(),
                    remaining_purse: bidder.remaining_purse(),
                    players_won: self.players_won(&bidder.id()),
                })
                .collect(),
            next_minimum_bid: self
                .active_player()
                .and_then(|player| minimum_acceptable(self.auction.rules(), player)),
            version: self.version,
        }
    }

    /// Drains events raised since load.
    pub fn take_events(&mut self) -> Vec<AuctionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Records a successful commit: new version, nothing dirty.
    pub fn mark_committed(&mut self, version: u64) {
        self.version = version;
        self.changes = FloorChanges::default();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    pub fn authorize_admin(&self, caller: &Caller) -> Result<(), AuctionError> {
        self.auction.authorize_admin(caller)
    }

    /// The owning admin bids for any team; a bidder only for its own.
    pub fn authorize_bid(&self, caller: &Caller, bidder_id: &BidderId) -> Result<(), AuctionError> {
        if self.auction.authorize_admin(caller).is_ok() {
            return Ok(());
        }
        let operates_team = caller.role == Role::Bidder
            && self
                .bidder(bidder_id)
                .map_or(false, |bidder| bidder.is_operated_by(&caller.user_id));
        if operates_team {
            Ok(())
        } else {
            Err(AuctionError::forbidden(format!(
                "user {} may not bid for {}",
                caller.user_id, bidder_id
            )))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bidding
    // ─────────────────────────────────────────────────────────────────────────

    /// Validates and records a bid as the player's current bid.
    ///
    /// Purse and player status are untouched; only a sale debits.
    pub fn place_bid(
        &mut self,
        bidder_id: BidderId,
        player_id: PlayerId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<BidReceipt, AuctionError> {
        let p = self.player_index(&player_id)?;
        let b = self.bidders.iter().position(|bidder| bidder.id() == bidder_id);

        let ctx = BidContext {
            auction: &self.auction,
            player: &self.players[p],
            bidder: b.map(|i| &self.bidders[i]),
            players_won: self.players_won(&bidder_id),
        };

        match validate_bid(ctx, &bidder_id, amount)? {
            BidDecision::AlreadyCurrent => {
                let bid = self.players[p]
                    .current_bid()
                    .cloned()
                    .ok_or(AuctionError::NoActiveBid(player_id))?;
                Ok(BidReceipt {
                    bid,
                    duplicate: true,
                })
            }
            BidDecision::Accept => {
                let b = b.ok_or(AuctionError::BidderNotInAuction(bidder_id))?;
                let bid = Bid::new(bidder_id, amount, now);
                self.players[p].accept_bid(bid.clone())?;
                self.changes.players.insert(player_id);

                let bidder = &self.bidders[b];
                self.events.push(AuctionEvent::NewBid(NewBid {
                    player_id,
                    bidder_id,
                    amount,
                    timestamp: now,
                    bidder_name: bidder.name().to_string(),
                    team_name: bidder.team_name().map(String::from),
                }));
                Ok(BidReceipt {
                    bid,
                    duplicate: false,
                })
            }
        }
    }

    /// Withdraws the latest bid on the player in bidding.
    pub fn undo_last_bid(
        &mut self,
        player_id: PlayerId,
        _now: Timestamp,
    ) -> Result<BidWithdrawal, AuctionError> {
        self.ensure_sale_actions_allowed()?;
        let p = self.player_index(&player_id)?;
        let withdrawn = self.players[p].withdraw_last_bid()?;
        let current = self.players[p].current_bid().cloned();
        self.changes.players.insert(player_id);

        self.events.push(AuctionEvent::BidUndo(BidUndo {
            player_id,
            bidder_id: withdrawn.bidder_id,
            previous_bid: current.clone(),
        }));
        Ok(BidWithdrawal { withdrawn, current })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sale state machine
    // ─────────────────────────────────────────────────────────────────────────

    /// AVAILABLE -> IN_BIDDING, claiming the auction's single active slot.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the auction is not LIVE, another player is in
    ///   bidding, or the player is not AVAILABLE
    pub fn start_bidding(
        &mut self,
        player_id: PlayerId,
        now: Timestamp,
    ) -> Result<Player, AuctionError> {
        self.auction.ensure_mutable()?;
        if self.auction.status() != AuctionStatus::Live {
            return Err(AuctionError::invalid_state(format!(
                "bidding can only start while LIVE, auction is {}",
                self.auction.status()
            )));
        }
        let p = self.player_index(&player_id)?;
        if self.players[p].status() != PlayerStatus::Available {
            return Err(AuctionError::invalid_state(format!(
                "player {} is {}, not AVAILABLE",
                player_id,
                self.players[p].status()
            )));
        }

        self.auction.claim_active_player(player_id, now)?;
        self.players[p].start_bidding()?;
        self.changes.auction = true;
        self.changes.players.insert(player_id);

        let player = self.players[p].clone();
        self.events.push(AuctionEvent::NewPlayer(NewPlayer {
            player: player.clone(),
        }));
        Ok(player)
    }

    /// IN_BIDDING -> SOLD with the purse debit in the same unit.
    ///
    /// # Errors
    ///
    /// - `NoActiveBid` if selling at the current bid and there is none
    /// - `SaleDoesNotMatchBid` if the terms differ from the current bid
    /// - `InsufficientPurse`, `TeamSizeExceeded` from the winning bidder
    pub fn mark_sold(
        &mut self,
        player_id: PlayerId,
        terms: SaleTerms,
        now: Timestamp,
    ) -> Result<SaleRecord, AuctionError> {
        self.ensure_sale_actions_allowed()?;
        let p = self.player_index(&player_id)?;
        let player = &self.players[p];
        if player.status() != PlayerStatus::InBidding {
            return Err(AuctionError::PlayerNotInBidding {
                player_id,
                status: player.status(),
            });
        }

        let (bidder_id, amount) = (terms.bidder_id(), terms.amount());
        if let SaleTerms::CurrentBid { .. } = terms {
            let current = player
                .current_bid()
                .ok_or(AuctionError::NoActiveBid(player_id))?;
            if !current.is_same_offer(&bidder_id, amount) {
                return Err(AuctionError::SaleDoesNotMatchBid {
                    expected_bidder: current.bidder_id,
                    expected_amount: current.amount,
                    supplied_bidder: bidder_id,
                    supplied_amount: amount,
                });
            }
        }

        let b = self.bidder_index(&bidder_id)?;
        let won = self.players_won(&bidder_id);
        let rules = self.auction.rules();
        if won >= rules.max_team_size {
            return Err(AuctionError::TeamSizeExceeded {
                won,
                max: rules.max_team_size,
            });
        }

        PurseLedger::debit(&mut self.bidders[b], amount, rules.purse_enforcement)?;
        self.players[p].mark_sold(bidder_id, amount)?;
        self.auction.release_active_player(player_id, now);
        let sale = SaleRecord {
            player_id,
            bidder_id,
            amount,
            sold_at: now,
        };
        self.auction.record_sale(sale.clone());

        self.changes.auction = true;
        self.changes.players.insert(player_id);
        self.changes.bidders.insert(bidder_id);
        self.events.push(AuctionEvent::PlayerSold(PlayerSold {
            player_id,
            bidder_id,
            amount,
            player_name: self.players[p].name().to_string(),
        }));
        Ok(sale)
    }

    /// IN_BIDDING -> UNSOLD. No purse effect.
    pub fn mark_unsold(&mut self, player_id: PlayerId, now: Timestamp) -> Result<(), AuctionError> {
        self.ensure_sale_actions_allowed()?;
        let p = self.player_index(&player_id)?;
        self.players[p].mark_unsold()?;
        self.auction.release_active_player(player_id, now);

        self.changes.auction = true;
        self.changes.players.insert(player_id);
        self.events.push(AuctionEvent::PlayerUnsold(PlayerUnsold {
            player_id,
            player_name: self.players[p].name().to_string(),
        }));
        Ok(())
    }

    /// SOLD -> IN_BIDDING for the most recent sale, crediting the purse.
    ///
    /// # Errors
    ///
    /// - `NothingToUndo` if the player is not the most recent sale
    /// - `InvalidState` if another player is in bidding
    pub fn undo_sale(
        &mut self,
        player_id: PlayerId,
        now: Timestamp,
    ) -> Result<SaleUndone, AuctionError> {
        self.ensure_sale_actions_allowed()?;
        let p = self.player_index(&player_id)?;
        match self.auction.last_sale() {
            Some(sale) if sale.player_id == player_id => {}
            Some(_) => {
                return Err(AuctionError::nothing_to_undo(format!(
                    "player {} is not the most recent sale",
                    player_id
                )))
            }
            None => return Err(AuctionError::nothing_to_undo("no sale to undo")),
        }
        if let Some(active) = self.auction.active_player() {
            return Err(AuctionError::invalid_state(format!(
                "player {} is in bidding; resolve it before undoing a sale",
                active
            )));
        }

        let reversal = self.players[p].revert_sale()?;
        let b = self.bidder_index(&reversal.bidder_id)?;
        let remaining_purse = PurseLedger::credit(&mut self.bidders[b], reversal.amount);
        self.auction.take_last_sale(now);
        self.auction.claim_active_player(player_id, now)?;

        self.changes.auction = true;
        self.changes.players.insert(player_id);
        self.changes.bidders.insert(reversal.bidder_id);
        self.events.push(AuctionEvent::SaleUndo(SaleUndo {
            player_id,
            bidder_id: reversal.bidder_id,
            amount: reversal.amount,
        }));
        Ok(SaleUndone {
            player_id,
            bidder_id: reversal.bidder_id,
            amount: reversal.amount,
            restored_bid: reversal.restored_bid,
            remaining_purse,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Auction lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// DRAFT -> LIVE once icon quota and bidder minimum are met.
    pub fn publish(&mut self, now: Timestamp) -> Result<(), AuctionError> {
        self.auction.ensure_mutable()?;
        if self.auction.status() != AuctionStatus::Draft {
            return Err(AuctionError::invalid_state(format!(
                "only DRAFT auctions can be published, auction is {}",
                self.auction.status()
            )));
        }
        let icons = self.players.iter().filter(|p| p.is_icon()).count() as u32;
        let violations =
            publish_violations(self.auction.rules(), icons, self.bidders.len() as u32);
        if !violations.is_empty() {
            return Err(AuctionError::PublishValidationFailed(violations));
        }

        self.auction.transition_to(AuctionStatus::Live, now)?;
        self.changes.auction = true;
        self.events
            .push(AuctionEvent::AuctionStarted(AuctionStarted {}));
        Ok(())
    }

    pub fn pause(&mut self, now: Timestamp) -> Result<(), AuctionError> {
        self.auction.transition_to(AuctionStatus::Paused, now)?;
        self.changes.auction = true;
        self.events.push(AuctionEvent::AuctionPaused(AuctionPaused {}));
        Ok(())
    }

    pub fn resume(&mut self, now: Timestamp) -> Result<(), AuctionError> {
        self.auction.ensure_mutable()?;
        if self.auction.status() != AuctionStatus::Paused {
            return Err(AuctionError::invalid_state(format!(
                "only PAUSED auctions can resume, auction is {}",
                self.auction.status()
            )));
        }
        self.auction.transition_to(AuctionStatus::Live, now)?;
        self.changes.auction = true;
        self.events
            .push(AuctionEvent::AuctionResumed(AuctionResumed {}));
        Ok(())
    }

    /// LIVE | PAUSED -> COMPLETED with no player left in bidding.
    pub fn complete(&mut self, now: Timestamp) -> Result<(), AuctionError> {
        self.auction.ensure_mutable()?;
        if let Some(active) = self.auction.active_player() {
            return Err(AuctionError::invalid_state(format!(
                "player {} is still in bidding",
                active
            )));
        }
        self.auction.transition_to(AuctionStatus::Completed, now)?;
        self.changes.auction = true;
        self.events.push(AuctionEvent::AuctionEnded(AuctionEnded {}));
        Ok(())
    }

    pub fn update_rules(&mut self, rules: AuctionRules, now: Timestamp) -> Result<(), AuctionError> {
        self.auction.ensure_mutable()?;
        self.auction.replace_rules(rules, now)?;
        self.changes.auction = true;
        Ok(())
    }

    /// Recomputes every purse from SOLD players. Allowed in any status.
    pub fn reconcile_purses(&mut self) -> Vec<PurseAdjustment> {
        let adjustments = PurseLedger::reconcile(self.bidders.iter_mut(), &self.players);
        if !adjustments.is_empty() {
            self.changes
                .bidders
                .extend(adjustments.iter().map(|a| a.bidder_id));
            self.events
                .push(AuctionEvent::PursesRecomputed(PursesRecomputed {
                    adjustments: adjustments.clone(),
                }));
        }
        adjustments
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn ensure_sale_actions_allowed(&self) -> Result<(), AuctionError> {
        self.auction.ensure_mutable()?;
        let status = self.auction.status();
        if !status.allows_sale_actions() {
            return Err(AuctionError::invalid_state(format!(
                "sale actions need a LIVE or PAUSED auction, auction is {}",
                status
            )));
        }
        Ok(())
    }

    fn player_index(&self, player_id: &PlayerId) -> Result<usize, AuctionError> {
        self.players
            .iter()
            .position(|p| &p.id() == player_id)
            .ok_or(AuctionError::PlayerNotFound(*player_id))
    }

    fn bidder_index(&self, bidder_id: &BidderId) -> Result<usize, AuctionError> {
        self.bidders
            .iter()
            .position(|b| &b.id() == bidder_id)
            .ok_or(AuctionError::BidderNotInAuction(*bidder_id))
    }
}
