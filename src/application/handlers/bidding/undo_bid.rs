//! UndoBidHandler - Command handler for withdrawing the latest bid.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::application::timer::TimerCoordinator;
use crate::domain::auction::AuctionError;
use crate::domain::floor::BidWithdrawal;
use crate::domain::foundation::{AuctionId, CommandMetadata, PlayerId, Timestamp};
use crate::domain::timer::TimerCommand;

#[derive(Debug, Clone)]
pub struct UndoBidCommand {
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoBidResult {
    pub withdrawal: BidWithdrawal,
    pub version: u64,
}

/// Admin withdraws the latest accepted bid; the one before it is current
/// again.
pub struct UndoBidHandler {
    executor: Arc<FloorExecutor>,
    timers: Arc<TimerCoordinator>,
}

impl UndoBidHandler {
    pub fn new(executor: Arc<FloorExecutor>, timers: Arc<TimerCoordinator>) -> Self {
        Self { executor, timers }
    }

    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id, player_id = %cmd.player_id))]
    pub async fn handle(
        &self,
        cmd: UndoBidCommand,
        metadata: CommandMetadata,
    ) -> Result<UndoBidResult, AuctionError> {
        let caller = metadata.caller.clone();
        let timers = &self.timers;
        let committed = self
            .executor
            .execute_and(
                cmd.auction_id,
                move |floor| {
                    floor.authorize_admin(&caller)?;
                    floor.undo_last_bid(cmd.player_id, Timestamp::now())
                },
                |_, version| {
                    timers.dispatch(
                        cmd.auction_id,
                        version,
                        TimerCommand::Reset {
                            player_id: cmd.player_id,
                        },
                    );
                },
            )
            .await?;

        Ok(UndoBidResult {
            withdrawal: committed.value,
            version: committed.version,
        })
    }
}
