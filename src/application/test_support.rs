//! Fixtures shared by application tests.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Map;

use crate::adapters::memory::{InMemoryAuctionStore, InMemoryPresenceStore, RecordingBroadcaster};
use crate::domain::auction::{Auction, AuctionRules};
use crate::domain::bidder::Bidder;
use crate::domain::floor::AuctionFloor;
use crate::domain::foundation::{
    Amount, AuctionId, BidderId, Caller, CommandMetadata, PlayerId, Timestamp, UserId,
};
use crate::domain::player::Player;

use super::executor::FloorExecutor;
use super::gateway::BroadcastGateway;
use super::presence::PresenceService;
use super::timer::TimerCoordinator;

pub const ADMIN: &str = "admin-1";
pub const BASE_PRICE: u64 = 500;
pub const PURSE: u64 = 5_000;

pub fn admin() -> CommandMetadata {
    CommandMetadata::new(Caller::admin(UserId::new(ADMIN).unwrap())).with_source("test")
}

pub fn stranger() -> CommandMetadata {
    CommandMetadata::new(Caller::admin(UserId::new("someone-else").unwrap()))
}

pub fn draft_floor_with(
    rules: AuctionRules,
    players: usize,
    icons: usize,
    bidders: usize,
) -> AuctionFloor {
    let id = AuctionId::new();
    let auction = Auction::new(id, UserId::new(ADMIN).unwrap(), "Test auction", rules).unwrap();
    let players = (0..players)
        .map(|n| {
            Player::new(
                PlayerId::new(),
                id,
                format!("Player {}", n),
                Amount::new(BASE_PRICE),
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
                format!("Bidder {}", n),
                Some(format!("Team {}", n)),
                Amount::new(PURSE),
            )
            .unwrap()
            .with_user(UserId::new(format!("captain-{}", n)).unwrap())
        })
        .collect();
    AuctionFloor::new(auction, players, bidders).unwrap()
}

pub fn draft_floor(players: usize, icons: usize, bidders: usize) -> AuctionFloor {
    draft_floor_with(AuctionRules::default(), players, icons, bidders)
}

pub struct Harness {
    pub store: Arc<InMemoryAuctionStore>,
    pub broadcaster: Arc<RecordingBroadcaster>,
    pub gateway: Arc<BroadcastGateway>,
    pub executor: Arc<FloorExecutor>,
    pub timers: Arc<TimerCoordinator>,
    pub presence: Arc<PresenceService>,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryAuctionStore::new());
    let broadcaster = Arc::new(RecordingBroadcaster::new());
    let gateway = Arc::new(BroadcastGateway::new(
        broadcaster.clone(),
        Duration::from_millis(100),
    ));
    let executor = Arc::new(FloorExecutor::new(
        store.clone(),
        gateway.clone(),
        Duration::from_millis(500),
        Duration::from_millis(500),
    ));
    let timers = Arc::new(TimerCoordinator::new(gateway.clone(), Duration::from_secs(1)));
    let presence = Arc::new(PresenceService::new(
        Arc::new(InMemoryPresenceStore::new()),
        gateway.clone(),
        Duration::from_millis(100),
        Duration::from_secs(45),
    ));
    Harness {
        store,
        broadcaster,
        gateway,
        executor,
        timers,
        presence,
    }
}

/// A seeded auction's ids.
pub struct Seeded {
    pub auction_id: AuctionId,
    pub players: Vec<PlayerId>,
    pub bidders: Vec<BidderId>,
}

impl Harness {
    /// Stores a LIVE auction with `players` players and `bidders` bidders.
    pub async fn live(&self, players: usize, bidders: usize) -> Seeded {
        let seeded = self.draft(players, bidders).await;
        self.executor
            .execute(seeded.auction_id, |floor| floor.publish(Timestamp::now()))
            .await
            .unwrap();
        self.broadcaster.clear();
        seeded
    }

    pub async fn draft(&self, players: usize, bidders: usize) -> Seeded {
        let floor = draft_floor(players, 0, bidders);
        self.executor.insert(&floor).await.unwrap();
        Seeded {
            auction_id: *floor.auction().id(),
            players: floor.players().iter().map(Player::id).collect(),
            bidders: floor.bidders().iter().map(Bidder::id).collect(),
        }
    }

    /// LIVE auction with the first player already in bidding.
    pub async fn bidding(&self, players: usize, bidders: usize) -> Seeded {
        let seeded = self.live(players, bidders).await;
        let player = seeded.players[0];
        self.executor
            .execute(seeded.auction_id, |floor| {
                floor.start_bidding(player, Timestamp::now())
            })
            .await
            .unwrap();
        self.broadcaster.clear();
        seeded
    }

    pub async fn floor(&self, auction_id: AuctionId) -> AuctionFloor {
        self.executor.load(auction_id).await.unwrap()
    }
}
