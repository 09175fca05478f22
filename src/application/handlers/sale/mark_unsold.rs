//! MarkUnsoldHandler - Command handler for passing on a player.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::application::timer::TimerCoordinator;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, CommandMetadata, PlayerId, Timestamp};
use crate::domain::timer::TimerCommand;

#[derive(Debug, Clone)]
pub struct MarkUnsoldCommand {
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkUnsoldResult {
    pub version: u64,
}

/// IN_BIDDING -> UNSOLD. Terminal; the player is not re-queued.
pub struct MarkUnsoldHandler {
    executor: Arc<FloorExecutor>,
    timers: Arc<TimerCoordinator>,
}

impl MarkUnsoldHandler {
    pub fn new(executor: Arc<FloorExecutor>, timers: Arc<TimerCoordinator>) -> Self {
        Self { executor, timers }
    }

    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id, player_id = %cmd.player_id))]
    pub async fn handle(
        &self,
        cmd: MarkUnsoldCommand,
        metadata: CommandMetadata,
    ) -> Result<MarkUnsoldResult, AuctionError> {
        let caller = metadata.caller.clone();
        let timers = &self.timers;
        let committed = self
            .executor
            .execute_and(
                cmd.auction_id,
                move |floor| {
                    floor.authorize_admin(&caller)?;
                    floor.mark_unsold(cmd.player_id, Timestamp::now())
                },
                |_, version| {
                    timers.dispatch(
                        cmd.auction_id,
                        version,
                        TimerCommand::Stop {
                            player_id: Some(cmd.player_id),
                        },
                    );
                },
            )
            .await?;

        Ok(MarkUnsoldResult {
            version: committed.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::sale::{StartBiddingCommand, StartBiddingHandler};
    use crate::application::test_support::{admin, harness};
    use crate::domain::player::PlayerStatus;

    #[tokio::test]
    async fn unsold_player_frees_the_slot_for_the_next() {
        let h = harness();
        let s = h.bidding(2, 2).await;

        MarkUnsoldHandler::new(h.executor.clone(), h.timers.clone())
            .handle(
                MarkUnsoldCommand {
                    auction_id: s.auction_id,
                    player_id: s.players[0],
                },
                admin(),
            )
            .await
            .unwrap();

        let floor = h.floor(s.auction_id).await;
        let player = floor.player(&s.players[0]).unwrap();
        assert_eq!(player.status(), PlayerStatus::Unsold);
        assert!(player.sold_to().is_none());
        assert!(h.broadcaster.last_named("player-unsold").is_some());

        StartBiddingHandler::new(h.executor.clone(), h.timers.clone())
            .handle(
                StartBiddingCommand {
                    auction_id: s.auction_id,
                    player_id: s.players[1],
                },
                admin(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unsold_is_terminal() {
        let h = harness();
        let s = h.bidding(2, 2).await;
        let handler = MarkUnsoldHandler::new(h.executor.clone(), h.timers.clone());
        let cmd = MarkUnsoldCommand {
            auction_id: s.auction_id,
            player_id: s.players[0],
        };
        handler.handle(cmd.clone(), admin()).await.unwrap();

        let err = handler.handle(cmd, admin()).await.unwrap_err();
        assert!(matches!(err, AuctionError::PlayerNotInBidding { .. }));

        let err = StartBiddingHandler::new(h.executor.clone(), h.timers.clone())
            .handle(
                StartBiddingCommand {
                    auction_id: s.auction_id,
                    player_id: s.players[0],
                },
                admin(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuctionError::InvalidState(_)));
    }
}
