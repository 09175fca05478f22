//! PauseAuctionHandler - LIVE -> PAUSED.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::application::timer::TimerCoordinator;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, CommandMetadata, Timestamp};
use crate::domain::timer::TimerCommand;

use super::LifecycleResult;

#[derive(Debug, Clone)]
pub struct PauseAuctionCommand {
    pub auction_id: AuctionId,
}

/// Stops new bids and holds the countdown where it is.
pub struct PauseAuctionHandler {
    executor: Arc<FloorExecutor>,
    timers: Arc<TimerCoordinator>,
}

impl PauseAuctionHandler {
    pub fn new(executor: Arc<FloorExecutor>, timers: Arc<TimerCoordinator>) -> Self {
        Self { executor, timers }
    }

    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id))]
    pub async fn handle(
        &self,
        cmd: PauseAuctionCommand,
        metadata: CommandMetadata,
    ) -> Result<LifecycleResult, AuctionError> {
        let caller = metadata.caller.clone();
        let timers = &self.timers;
        let committed = self
            .executor
            .execute_and(
                cmd.auction_id,
                move |floor| {
                    floor.authorize_admin(&caller)?;
                    floor.pause(Timestamp::now())?;
                    Ok(floor.auction().status())
                },
                |_, version| {
                    timers.dispatch(cmd.auction_id, version, TimerCommand::Freeze);
                },
            )
            .await?;

        Ok(LifecycleResult {
            status: committed.value,
            version: committed.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::bidding::{PlaceBidCommand, PlaceBidHandler};
    use crate::application::test_support::{admin, harness};
    use crate::domain::auction::AuctionStatus;
    use crate::domain::foundation::Amount;

    #[tokio::test]
    async fn paused_auction_rejects_bids() {
        let h = harness();
        let s = h.bidding(2, 2).await;

        let result = PauseAuctionHandler::new(h.executor.clone(), h.timers.clone())
            .handle(
                PauseAuctionCommand {
                    auction_id: s.auction_id,
                },
                admin(),
            )
            .await
            .unwrap();
        assert_eq!(result.status, AuctionStatus::Paused);

        let err = PlaceBidHandler::new(h.executor.clone(), h.timers.clone())
            .handle(
                PlaceBidCommand {
                    auction_id: s.auction_id,
                    player_id: s.players[0],
                    bidder_id: s.bidders[0],
                    amount: Amount::new(500),
                },
                admin(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::AuctionNotLive {
                status: AuctionStatus::Paused
            }
        ));
    }

    #[tokio::test]
    async fn draft_cannot_pause() {
        let h = harness();
        let s = h.draft(2, 2).await;

        let err = PauseAuctionHandler::new(h.executor.clone(), h.timers.clone())
            .handle(
                PauseAuctionCommand {
                    auction_id: s.auction_id,
                },
                admin(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AuctionError::InvalidState(_)));
    }
}
