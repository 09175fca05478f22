//! End-to-end auction flows through the engine with in-memory adapters.
//!
//! Covers the bidding ladder, sale and undo purse accounting, publish
//! checks, pause and resume of the countdown, and viewer presence.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Map;

use live_auction::adapters::{InMemoryAuctionStore, InMemoryPresenceStore, RecordingBroadcaster};
use live_auction::application::{AuctionEngine, BroadcastGateway, MarkSoldCommand, PresenceService};
use live_auction::config::EngineConfig;
use live_auction::domain::auction::{
    Auction, AuctionError, AuctionRules, AuctionStatus, PublishRuleViolation,
};
use live_auction::domain::bidder::Bidder;
use live_auction::domain::floor::AuctionFloor;
use live_auction::domain::foundation::{
    Amount, AuctionId, BidderId, Caller, CommandMetadata, PlayerId, Timestamp, UserId, ViewerId,
};
use live_auction::domain::player::{Player, PlayerStatus};
use live_auction::domain::timer::CountdownState;
use live_auction::ports::Channel;

// =============================================================================
// Test Infrastructure
// =============================================================================

const ADMIN: &str = "organizer";
const PURSE: u64 = 10_000;

struct TestAuction {
    engine: AuctionEngine,
    broadcaster: Arc<RecordingBroadcaster>,
    auction_id: AuctionId,
    players: Vec<PlayerId>,
    bidders: Vec<BidderId>,
}

fn admin() -> CommandMetadata {
    CommandMetadata::new(Caller::admin(UserId::new(ADMIN).unwrap())).with_source("integration")
}

fn captain(n: usize) -> CommandMetadata {
    CommandMetadata::new(Caller::bidder(UserId::new(format!("captain-{}", n)).unwrap()))
}

fn build_floor(rules: AuctionRules, players: usize, icons: usize, bidders: usize) -> AuctionFloor {
    let id = AuctionId::new();
    let auction = Auction::new(id, UserId::new(ADMIN).unwrap(), "Premier draft", rules).unwrap();
    let players = (0..players)
        .map(|n| {
            Player::new(
                PlayerId::new(),
                id,
                format!("Player {}", n),
                Amount::new(500),
                n < icons,
                Map::new(),
            )
            .unwrap()
        })
        .collect();
    let bidders = (0..bidders)
        .map(|n| {
            Bidder::new(
                BidderId::new(),
                id,
                format!("Owner {}", n),
                Some(format!("Franchise {}", n)),
                Amount::new(PURSE),
            )
            .unwrap()
            .with_user(UserId::new(format!("captain-{}", n)).unwrap())
        })
        .collect();
    AuctionFloor::new(auction, players, bidders).unwrap()
}

async fn registered(rules: AuctionRules, players: usize, icons: usize, bidders: usize) -> TestAuction {
    let broadcaster = Arc::new(RecordingBroadcaster::new());
    let engine = AuctionEngine::new(
        Arc::new(InMemoryAuctionStore::new()),
        broadcaster.clone(),
        Arc::new(InMemoryPresenceStore::new()),
        &EngineConfig::default(),
    );
    let floor = build_floor(rules, players, icons, bidders);
    engine.register_auction(&floor).await.unwrap();
    TestAuction {
        engine,
        broadcaster,
        auction_id: *floor.auction().id(),
        players: floor.players().iter().map(Player::id).collect(),
        bidders: floor.bidders().iter().map(Bidder::id).collect(),
    }
}

async fn live(players: usize, bidders: usize) -> TestAuction {
    let auction = registered(AuctionRules::default(), players, 0, bidders).await;
    auction.engine.publish(auction.auction_id, admin()).await.unwrap();
    auction
}

async fn remaining_purse(auction: &TestAuction, bidder: BidderId) -> Amount {
    let state = auction.engine.auction_state(auction.auction_id).await.unwrap();
    state
        .floor
        .bidders
        .iter()
        .find(|standing| standing.bidder.id() == bidder)
        .map(|standing| standing.remaining_purse)
        .unwrap()
}

// =============================================================================
// Bidding
// =============================================================================

#[tokio::test(start_paused = true)]
async fn raises_must_clear_the_minimum_increment() {
    let mut rules = AuctionRules::default();
    rules.min_bid_increment = Amount::new(50);
    let auction = registered(rules, 3, 0, 2).await;
    let (a, p) = (auction.auction_id, auction.players[0]);
    let (first, second) = (auction.bidders[0], auction.bidders[1]);
    auction.engine.publish(a, admin()).await.unwrap();
    auction.engine.start_bidding(a, p, admin()).await.unwrap();

    auction
        .engine
        .place_bid(a, p, first, Amount::new(500), captain(0))
        .await
        .unwrap();
    let err = auction
        .engine
        .place_bid(a, p, second, Amount::new(540), captain(1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AuctionError::AmountBelowMinimumIncrement {
            amount: Amount::new(540),
            minimum: Amount::new(550),
        }
    );
    auction
        .engine
        .place_bid(a, p, second, Amount::new(550), captain(1))
        .await
        .unwrap();
    let top = auction
        .engine
        .place_bid(a, p, first, Amount::new(600), captain(0))
        .await
        .unwrap();

    assert_eq!(top.bid.amount, Amount::new(600));
    let state = auction.engine.auction_state(a).await.unwrap();
    let player = state.floor.players.iter().find(|pl| pl.id() == p).unwrap();
    assert_eq!(player.bid_history().len(), 3);
    assert_eq!(state.floor.next_minimum_bid, Some(Amount::new(650)));
    assert_eq!(
        auction.broadcaster.event_names(&Channel::Auction(a)).iter().filter(|e| *e == "new-bid").count(),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn bids_against_a_paused_auction_are_rejected() {
    let auction = live(2, 2).await;
    let (a, p) = (auction.auction_id, auction.players[0]);
    auction.engine.start_bidding(a, p, admin()).await.unwrap();
    auction.engine.pause(a, admin()).await.unwrap();

    let err = auction
        .engine
        .place_bid(a, p, auction.bidders[0], Amount::new(500), captain(0))
        .await
        .unwrap_err();
    assert_eq!(err, AuctionError::AuctionNotLive { status: AuctionStatus::Paused });
}

// =============================================================================
// Sales and purses
// =============================================================================

#[tokio::test(start_paused = true)]
async fn sale_debits_purse_and_undo_restores_it() {
    let auction = live(3, 2).await;
    let (a, p, b) = (auction.auction_id, auction.players[0], auction.bidders[0]);
    auction.engine.start_bidding(a, p, admin()).await.unwrap();
    auction
        .engine
        .place_bid(a, p, b, Amount::new(1_200), captain(0))
        .await
        .unwrap();

    let sold = auction
        .engine
        .mark_sold(
            MarkSoldCommand {
                auction_id: a,
                player_id: p,
                bidder_id: b,
                amount: Amount::new(1_200),
                override_bid: false,
            },
            admin(),
        )
        .await
        .unwrap();
    assert_eq!(sold.remaining_purse, Amount::new(PURSE - 1_200));
    assert_eq!(remaining_purse(&auction, b).await, Amount::new(PURSE - 1_200));

    let undone = auction.engine.undo_sale(a, p, admin()).await.unwrap();
    assert_eq!(undone.undone.remaining_purse, Amount::new(PURSE));
    assert_eq!(remaining_purse(&auction, b).await, Amount::new(PURSE));

    let state = auction.engine.auction_state(a).await.unwrap();
    let player = state.floor.players.iter().find(|pl| pl.id() == p).unwrap();
    assert_eq!(player.status(), PlayerStatus::InBidding);
    assert_eq!(player.current_bid().map(|bid| bid.amount), Some(Amount::new(1_200)));

    let recompute = auction.engine.recompute_purses(a, admin()).await.unwrap();
    assert!(recompute.adjustments.is_empty());
}

#[tokio::test(start_paused = true)]
async fn only_one_player_is_on_the_block() {
    let auction = live(3, 2).await;
    let a = auction.auction_id;
    auction.engine.start_bidding(a, auction.players[0], admin()).await.unwrap();

    let err = auction
        .engine
        .start_bidding(a, auction.players[1], admin())
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::InvalidState(_)));

    auction.engine.mark_unsold(a, auction.players[0], admin()).await.unwrap();
    auction.engine.start_bidding(a, auction.players[1], admin()).await.unwrap();
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn publish_reports_icon_quota_mismatch() {
    let mut rules = AuctionRules::default();
    rules.icon_player_quota = Some(3);
    let auction = registered(rules, 5, 2, 2).await;

    let err = auction.engine.publish(auction.auction_id, admin()).await.unwrap_err();
    match err {
        AuctionError::PublishValidationFailed(violations) => assert_eq!(
            violations,
            vec![PublishRuleViolation::IconPlayerCountMismatch { expected: 3, actual: 2 }]
        ),
        other => panic!("expected publish violation, got {:?}", other),
    }
    let state = auction.engine.auction_state(auction.auction_id).await.unwrap();
    assert_eq!(state.floor.auction.status(), AuctionStatus::Draft);
}

#[tokio::test(start_paused = true)]
async fn pause_freezes_the_countdown_and_resume_continues_it() {
    let auction = live(2, 2).await;
    let (a, p) = (auction.auction_id, auction.players[0]);
    auction.engine.start_bidding(a, p, admin()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(18_500)).await;
    auction.engine.pause(a, admin()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;

    let countdown = auction.engine.auction_state(a).await.unwrap().countdown.unwrap();
    assert_eq!(countdown.remaining_secs(), 12);
    assert_eq!(countdown.state(), CountdownState::Frozen);

    auction.engine.resume(a, admin()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_100)).await;
    let countdown = auction.engine.auction_state(a).await.unwrap().countdown.unwrap();
    assert_eq!(countdown.remaining_secs(), 10);
    assert_eq!(countdown.state(), CountdownState::Running);
}

#[tokio::test(start_paused = true)]
async fn completed_auction_rejects_further_commands() {
    let auction = live(2, 2).await;
    let a = auction.auction_id;
    let result = auction.engine.complete(a, admin()).await.unwrap();
    assert_eq!(result.status, AuctionStatus::Completed);

    let err = auction
        .engine
        .start_bidding(a, auction.players[0], admin())
        .await
        .unwrap_err();
    assert_eq!(err, AuctionError::AuctionCompleted);
}

// =============================================================================
// Presence
// =============================================================================

#[tokio::test]
async fn viewer_count_tracks_joins_and_leaves() {
    let auction = live(1, 2).await;
    let a = auction.auction_id;
    let viewers: Vec<ViewerId> = (0..5).map(|_| ViewerId::generate()).collect();
    for viewer in &viewers {
        auction.engine.join_viewer(a, viewer.clone()).await.unwrap();
    }
    for viewer in viewers.iter().take(2) {
        auction.engine.leave_viewer(a, viewer.clone()).await.unwrap();
    }
    // Repeated leave is a no-op
    auction.engine.leave_viewer(a, viewers[0].clone()).await.unwrap();

    assert_eq!(auction.engine.viewer_count(a).await.unwrap(), 3);
    let state = auction.engine.auction_state(a).await.unwrap();
    assert_eq!(state.viewer_count, Some(3));
}

#[tokio::test]
async fn sweep_expires_silent_viewers_only() {
    let broadcaster = Arc::new(RecordingBroadcaster::new());
    let gateway = Arc::new(BroadcastGateway::new(broadcaster.clone(), Duration::from_millis(100)));
    let presence = PresenceService::new(
        Arc::new(InMemoryPresenceStore::new()),
        gateway,
        Duration::from_millis(100),
        Duration::from_secs(45),
    );
    let auction_id = AuctionId::new();
    let start = Timestamp::now();
    let silent = ViewerId::generate();
    let active = ViewerId::generate();
    presence.join(auction_id, &silent, start).await.unwrap();
    presence.join(auction_id, &active, start).await.unwrap();
    presence
        .heartbeat(auction_id, &active, start.plus_secs(40))
        .await
        .unwrap();

    let report = presence.sweep_all(start.plus_secs(60)).await.unwrap();

    assert_eq!(report.expired, 1);
    assert_eq!(presence.count(auction_id).await.unwrap(), 1);
    let last = broadcaster.last_named("viewer-count-update").unwrap();
    assert_eq!(last.data["count"], 1);
    assert!(last.version.is_none());
}
