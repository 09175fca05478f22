//! AuctionEngine - the facade callers (HTTP routes, websocket handler,
//! automation) use for every core operation.
//!
//! It owns the shared pieces (executor, timers, presence, gateway) and one
//! handler per operation. Every method returns a result or a tagged
//! [`AuctionError`].

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::EngineConfig;
use crate::domain::auction::{AuctionError, AuctionRules};
use crate::domain::floor::AuctionFloor;
use crate::domain::foundation::{
    Amount, AuctionId, BidderId, CommandMetadata, PlayerId, ViewerId,
};
use crate::ports::{AuctionStore, Broadcaster, PresenceStore, TimerBus};

use super::executor::FloorExecutor;
use super::gateway::BroadcastGateway;
use super::handlers::*;
use super::presence::{PresenceService, PresenceSweeper};
use super::timer::{TimerCoordinator, TimerExpiry};

pub struct AuctionEngine {
    executor: Arc<FloorExecutor>,
    timers: Arc<TimerCoordinator>,
    presence: Arc<PresenceService>,
    sweep_interval: std::time::Duration,

    place_bid: PlaceBidHandler,
    undo_bid: UndoBidHandler,
    start_bidding: StartBiddingHandler,
    mark_sold: MarkSoldHandler,
    mark_unsold: MarkUnsoldHandler,
    undo_sale: UndoSaleHandler,
    publish: PublishAuctionHandler,
    pause: PauseAuctionHandler,
    resume: ResumeAuctionHandler,
    complete: CompleteAuctionHandler,
    update_rules: UpdateRulesHandler,
    recompute_purses: RecomputePursesHandler,
    join_viewer: JoinViewerHandler,
    leave_viewer: LeaveViewerHandler,
    heartbeat_viewer: HeartbeatViewerHandler,
    auction_state: GetAuctionStateHandler,
    viewer_count: GetViewerCountHandler,
}

impl AuctionEngine {
    /// An engine whose countdowns live in this process only.
    pub fn new(
        store: Arc<dyn AuctionStore>,
        broadcaster: Arc<dyn Broadcaster>,
        presence_store: Arc<dyn PresenceStore>,
        config: &EngineConfig,
    ) -> Self {
        Self::build(store, broadcaster, presence_store, None, config)
    }

    /// An engine that shares countdown commands with the other instances
    /// over `timer_bus`. Feed the bus's incoming signals to
    /// [`TimerCoordinator::receive`] via [`timers`](Self::timers).
    pub fn clustered(
        store: Arc<dyn AuctionStore>,
        broadcaster: Arc<dyn Broadcaster>,
        presence_store: Arc<dyn PresenceStore>,
        timer_bus: Arc<dyn TimerBus>,
        config: &EngineConfig,
    ) -> Self {
        Self::build(store, broadcaster, presence_store, Some(timer_bus), config)
    }

    fn build(
        store: Arc<dyn AuctionStore>,
        broadcaster: Arc<dyn Broadcaster>,
        presence_store: Arc<dyn PresenceStore>,
        timer_bus: Option<Arc<dyn TimerBus>>,
        config: &EngineConfig,
    ) -> Self {
        let gateway = Arc::new(BroadcastGateway::new(broadcaster, config.broadcast_timeout()));
        let executor = Arc::new(FloorExecutor::new(
            store,
            gateway.clone(),
            config.lock_timeout(),
            config.store_timeout(),
        ));
        let timers = Arc::new(match timer_bus {
            Some(bus) => TimerCoordinator::with_bus(
                gateway.clone(),
                config.tick_interval(),
                bus,
                config.broadcast_timeout(),
            ),
            None => TimerCoordinator::new(gateway.clone(), config.tick_interval()),
        });
        let presence = Arc::new(PresenceService::new(
            presence_store,
            gateway.clone(),
            config.store_timeout(),
            config.heartbeat_timeout(),
        ));

        Self {
            place_bid: PlaceBidHandler::new(executor.clone(), timers.clone()),
            undo_bid: UndoBidHandler::new(executor.clone(), timers.clone()),
            start_bidding: StartBiddingHandler::new(executor.clone(), timers.clone()),
            mark_sold: MarkSoldHandler::new(executor.clone(), timers.clone(), gateway),
            mark_unsold: MarkUnsoldHandler::new(executor.clone(), timers.clone()),
            undo_sale: UndoSaleHandler::new(executor.clone(), timers.clone()),
            publish: PublishAuctionHandler::new(executor.clone()),
            pause: PauseAuctionHandler::new(executor.clone(), timers.clone()),
            resume: ResumeAuctionHandler::new(executor.clone(), timers.clone()),
            complete: CompleteAuctionHandler::new(executor.clone(), timers.clone()),
            update_rules: UpdateRulesHandler::new(executor.clone()),
            recompute_purses: RecomputePursesHandler::new(executor.clone()),
            join_viewer: JoinViewerHandler::new(presence.clone()),
            leave_viewer: LeaveViewerHandler::new(presence.clone()),
            heartbeat_viewer: HeartbeatViewerHandler::new(presence.clone()),
            auction_state: GetAuctionStateHandler::new(
                executor.clone(),
                timers.clone(),
                presence.clone(),
            ),
            viewer_count: GetViewerCountHandler::new(presence.clone()),
            sweep_interval: config.sweep_interval(),
            executor,
            timers,
            presence,
        }
    }

    /// Stores a floor prepared by the setup flow (roster import, bidder
    /// registration). It enters in whatever status it was built with.
    pub async fn register_auction(&self, floor: &AuctionFloor) -> Result<(), AuctionError> {
        self.executor.insert(floor).await?;
        tracing::info!(
            auction_id = %floor.auction().id(),
            players = floor.players().len(),
            bidders = floor.bidders().len(),
            "Auction registered"
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Bidding
    // ─────────────────────────────────────────────────────────────────────

    pub async fn place_bid(
        &self,
        auction_id: AuctionId,
        player_id: PlayerId,
        bidder_id: BidderId,
        amount: Amount,
        metadata: CommandMetadata,
    ) -> Result<PlaceBidResult, AuctionError> {
        self.place_bid
            .handle(
                PlaceBidCommand {
                    auction_id,
                    player_id,
                    bidder_id,
                    amount,
                },
                metadata,
            )
            .await
    }

    pub async fn undo_bid(
        &self,
        auction_id: AuctionId,
        player_id: PlayerId,
        metadata: CommandMetadata,
    ) -> Result<UndoBidResult, AuctionError> {
        self.undo_bid
            .handle(
                UndoBidCommand {
                    auction_id,
                    player_id,
                },
                metadata,
            )
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sales
    // ─────────────────────────────────────────────────────────────────────

    pub async fn start_bidding(
        &self,
        auction_id: AuctionId,
        player_id: PlayerId,
        metadata: CommandMetadata,
    ) -> Result<StartBiddingResult, AuctionError> {
        self.start_bidding
            .handle(
                StartBiddingCommand {
                    auction_id,
                    player_id,
                },
                metadata,
            )
            .await
    }

    pub async fn mark_sold(
        &self,
        cmd: MarkSoldCommand,
        metadata: CommandMetadata,
    ) -> Result<MarkSoldResult, AuctionError> {
        self.mark_sold.handle(cmd, metadata).await
    }

    pub async fn mark_unsold(
        &self,
        auction_id: AuctionId,
        player_id: PlayerId,
        metadata: CommandMetadata,
    ) -> Result<MarkUnsoldResult, AuctionError> {
        self.mark_unsold
            .handle(
                MarkUnsoldCommand {
                    auction_id,
                    player_id,
                },
                metadata,
            )
            .await
    }

    pub async fn undo_sale(
        &self,
        auction_id: AuctionId,
        player_id: PlayerId,
        metadata: CommandMetadata,
    ) -> Result<UndoSaleResult, AuctionError> {
        self.undo_sale
            .handle(
                UndoSaleCommand {
                    auction_id,
                    player_id,
                },
                metadata,
            )
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    pub async fn publish(
        &self,
        auction_id: AuctionId,
        metadata: CommandMetadata,
    ) -> Result<LifecycleResult, AuctionError> {
        self.publish
            .handle(PublishAuctionCommand { auction_id }, metadata)
            .await
    }

    pub async fn pause(
        &self,
        auction_id: AuctionId,
        metadata: CommandMetadata,
    ) -> Result<LifecycleResult, AuctionError> {
        self.pause
            .handle(PauseAuctionCommand { auction_id }, metadata)
            .await
    }

    pub async fn resume(
        &self,
        auction_id: AuctionId,
        metadata: CommandMetadata,
    ) -> Result<LifecycleResult, AuctionError> {
        self.resume
            .handle(ResumeAuctionCommand { auction_id }, metadata)
            .await
    }

    pub async fn complete(
        &self,
        auction_id: AuctionId,
        metadata: CommandMetadata,
    ) -> Result<LifecycleResult, AuctionError> {
        self.complete
            .handle(CompleteAuctionCommand { auction_id }, metadata)
            .await
    }

    pub async fn update_rules(
        &self,
        auction_id: AuctionId,
        rules: AuctionRules,
        metadata: CommandMetadata,
    ) -> Result<u64, AuctionError> {
        self.update_rules
            .handle(UpdateRulesCommand { auction_id, rules }, metadata)
            .await
    }

    pub async fn recompute_purses(
        &self,
        auction_id: AuctionId,
        metadata: CommandMetadata,
    ) -> Result<RecomputePursesResult, AuctionError> {
        self.recompute_purses
            .handle(RecomputePursesCommand { auction_id }, metadata)
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Viewers
    // ─────────────────────────────────────────────────────────────────────

    pub async fn join_viewer(
        &self,
        auction_id: AuctionId,
        viewer_id: ViewerId,
    ) -> Result<u64, AuctionError> {
        self.join_viewer
            .handle(JoinViewerCommand {
                auction_id,
                viewer_id,
            })
            .await
    }

    pub async fn leave_viewer(
        &self,
        auction_id: AuctionId,
        viewer_id: ViewerId,
    ) -> Result<u64, AuctionError> {
        self.leave_viewer
            .handle(LeaveViewerCommand {
                auction_id,
                viewer_id,
            })
            .await
    }

    pub async fn heartbeat_viewer(
        &self,
        auction_id: AuctionId,
        viewer_id: ViewerId,
    ) -> Result<u64, AuctionError> {
        self.heartbeat_viewer
            .handle(HeartbeatViewerCommand {
                auction_id,
                viewer_id,
            })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    pub async fn auction_state(&self, auction_id: AuctionId) -> Result<AuctionState, AuctionError> {
        self.auction_state
            .handle(GetAuctionStateQuery { auction_id })
            .await
    }

    pub async fn viewer_count(&self, auction_id: AuctionId) -> Result<u64, AuctionError> {
        self.viewer_count
            .handle(GetViewerCountQuery { auction_id })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Background work
    // ─────────────────────────────────────────────────────────────────────

    /// Countdown expiries, for automated sale policy.
    pub fn subscribe_expiries(&self) -> broadcast::Receiver<TimerExpiry> {
        self.timers.subscribe_expiries()
    }

    /// A sweeper to spawn with a shutdown signal.
    pub fn presence_sweeper(&self) -> PresenceSweeper {
        PresenceSweeper::new(self.presence.clone(), self.sweep_interval)
    }

    pub fn timers(&self) -> Arc<TimerCoordinator> {
        Arc::clone(&self.timers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAuctionStore, InMemoryPresenceStore, RecordingBroadcaster};
    use crate::application::test_support::{admin, draft_floor};
    use crate::domain::auction::AuctionStatus;

    fn engine() -> AuctionEngine {
        AuctionEngine::new(
            Arc::new(InMemoryAuctionStore::new()),
            Arc::new(RecordingBroadcaster::new()),
            Arc::new(InMemoryPresenceStore::new()),
            &EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn registered_auction_is_readable_and_publishable() {
        let engine = engine();
        let floor = draft_floor(3, 0, 2);
        let auction_id = *floor.auction().id();

        engine.register_auction(&floor).await.unwrap();
        let result = engine.publish(auction_id, admin()).await.unwrap();

        assert_eq!(result.status, AuctionStatus::Live);
        let state = engine.auction_state(auction_id).await.unwrap();
        assert_eq!(state.floor.auction.status(), AuctionStatus::Live);
        assert_eq!(state.floor.version, result.version);
    }

    #[tokio::test]
    async fn registering_twice_is_rejected() {
        let engine = engine();
        let floor = draft_floor(1, 0, 2);

        engine.register_auction(&floor).await.unwrap();
        let err = engine.register_auction(&floor).await.unwrap_err();

        assert!(matches!(err, AuctionError::ConcurrentModification));
    }
}
