//! Events published on an auction channel after a floor commit.

use serde::Serialize;

use crate::domain::foundation::{
    Amount, BidderId, BroadcastEvent, EventMessage, PlayerId, Timestamp,
};
use crate::domain::player::{Bid, Player};
use crate::domain::purse::PurseAdjustment;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBid {
    pub player_id: PlayerId,
    pub bidder_id: BidderId,
    pub amount: Amount,
    pub timestamp: Timestamp,
    pub bidder_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
}

crate::broadcast_event!(NewBid, "new-bid");

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidUndo {
    pub player_id: PlayerId,
    /// Bidder whose bid was withdrawn.
    pub bidder_id: BidderId,
    /// Bid that is current again, if any.
    pub previous_bid: Option<Bid>,
}

crate::broadcast_event!(BidUndo, "bid-undo");

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSold {
    pub player_id: PlayerId,
    pub bidder_id: BidderId,
    pub amount: Amount,
    pub player_name: String,
}

crate::broadcast_event!(PlayerSold, "player-sold");

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUnsold {
    pub player_id: PlayerId,
    pub player_name: String,
}

crate::broadcast_event!(PlayerUnsold, "player-unsold");

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleUndo {
    pub player_id: PlayerId,
    pub bidder_id: BidderId,
    pub amount: Amount,
}

crate::broadcast_event!(SaleUndo, "sale-undo");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPlayer {
    pub player: Player,
}

crate::broadcast_event!(NewPlayer, "new-player");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionStarted {}

crate::broadcast_event!(AuctionStarted, "auction-started");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionPaused {}

crate::broadcast_event!(AuctionPaused, "auction-paused");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionResumed {}

crate::broadcast_event!(AuctionResumed, "auction-resumed");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionEnded {}

crate::broadcast_event!(AuctionEnded, "auction-ended");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PursesRecomputed {
    pub adjustments: Vec<PurseAdjustment>,
}

crate::broadcast_event!(PursesRecomputed, "purses-recomputed");

/// Every state event a floor operation can raise.
#[derive(Debug, Clone, PartialEq)]
pub enum AuctionEvent {
    NewBid(NewBid),
    BidUndo(BidUndo),
    PlayerSold(PlayerSold),
    PlayerUnsold(PlayerUnsold),
    SaleUndo(SaleUndo),
    NewPlayer(NewPlayer),
    AuctionStarted(AuctionStarted),
    AuctionPaused(AuctionPaused),
    AuctionResumed(AuctionResumed),
    AuctionEnded(AuctionEnded),
    PursesRecomputed(PursesRecomputed),
}

impl AuctionEvent {
    fn payload(&self) -> &dyn ErasedEvent {
        match self {
            AuctionEvent::NewBid(e) => e,
            AuctionEvent::BidUndo(e) => e,
            AuctionEvent::PlayerSold(e) => e,
            AuctionEvent::PlayerUnsold(e) => e,
            AuctionEvent::SaleUndo(e) => e,
            AuctionEvent::NewPlayer(e) => e,
            AuctionEvent::AuctionStarted(e) => e,
            AuctionEvent::AuctionPaused(e) => e,
            AuctionEvent::AuctionResumed(e) => e,
            AuctionEvent::AuctionEnded(e) => e,
            AuctionEvent::PursesRecomputed(e) => e,
        }
    }

    pub fn event_name(&self) -> &'static str {
        self.payload().name()
    }

    /// Transport form stamped with the floor version that produced it.
    pub fn to_message(&self, version: u64) -> Result<EventMessage, serde_json::Error> {
        self.payload().message().map(|m| m.with_version(version))
    }
}

/// Object-safe view of a [`BroadcastEvent`].
trait ErasedEvent {
    fn name(&self) -> &'static str;
    fn message(&self) -> Result<EventMessage, serde_json::Error>;
}

impl<T: BroadcastEvent> ErasedEvent for T {
    fn name(&self) -> &'static str {
        self.event_name()
    }

    fn message(&self) -> Result<EventMessage, serde_json::Error> {
        self.to_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_bid_payload_uses_wire_field_names() {
        let player_id = PlayerId::new();
        let bidder_id = BidderId::new();
        let event = AuctionEvent::NewBid(NewBid {
            player_id,
            bidder_id,
            amount: Amount::new(600),
            timestamp: Timestamp::now(),
            bidder_name: "Asha".to_string(),
            team_name: None,
        });

        let message = event.to_message(4).unwrap();
        assert_eq!(message.event, "new-bid");
        assert_eq!(message.version, Some(4));
        assert_eq!(message.data["bidderId"], json!(bidder_id.to_string()));
        assert_eq!(message.data["amount"], json!(600));
        assert_eq!(message.data["bidderName"], json!("Asha"));
        assert!(message.data.get("teamName").is_none());
    }

    #[test]
    fn lifecycle_events_have_empty_payloads() {
        let message = AuctionEvent::AuctionPaused(AuctionPaused {})
            .to_message(1)
            .unwrap();
        assert_eq!(message.event, "auction-paused");
        assert_eq!(message.data, json!({}));
    }

    #[test]
    fn event_names_match_catalogue() {
        let player_id = PlayerId::new();
        let names: Vec<_> = [
            AuctionEvent::SaleUndo(SaleUndo {
                player_id,
                bidder_id: BidderId::new(),
                amount: Amount::new(1),
            }),
            AuctionEvent::AuctionResumed(AuctionResumed {}),
            AuctionEvent::AuctionEnded(AuctionEnded {}),
            AuctionEvent::PursesRecomputed(PursesRecomputed {
                adjustments: vec![],
            }),
        ]
        .iter()
        .map(AuctionEvent::event_name)
        .collect();
        assert_eq!(
            names,
            vec!["sale-undo", "auction-resumed", "auction-ended", "purses-recomputed"]
        );
    }
}
