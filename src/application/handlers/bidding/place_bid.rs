//! PlaceBidHandler - Command handler for bids on the player in bidding.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::application::timer::TimerCoordinator;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{
    Amount, AuctionId, BidderId, CommandMetadata, PlayerId, Timestamp, ValidationError,
};
use crate::domain::player::Bid;
use crate::domain::timer::TimerCommand;

/// Command to bid on the player currently in bidding.
#[derive(Debug, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
    pub bidder_id: BidderId,
    pub amount: Amount,
}

/// Result of an accepted bid.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceBidResult {
    /// The player's current bid after the call.
    pub bid: Bid,
    /// The same bid was already current; nothing changed.
    pub duplicate: bool,
    pub version: u64,
}

/// Handler for bids.
pub struct PlaceBidHandler {
    executor: Arc<FloorExecutor>,
    timers: Arc<TimerCoordinator>,
}

impl PlaceBidHandler {
    pub fn new(executor: Arc<FloorExecutor>, timers: Arc<TimerCoordinator>) -> Self {
        Self { executor, timers }
    }

    #[tracing::instrument(
        skip_all,
        fields(
            auction_id = %cmd.auction_id,
            player_id = %cmd.player_id,
            bidder_id = %cmd.bidder_id,
            amount = %cmd.amount
        )
    )]
    pub async fn handle(
        &self,
        cmd: PlaceBidCommand,
        metadata: CommandMetadata,
    ) -> Result<PlaceBidResult, AuctionError> {
        // 1. Reject malformed input before touching state
        if cmd.amount.is_zero() {
            return Err(ValidationError::out_of_range("amount", 1, i64::MAX, 0).into());
        }

        // 2. Authorize, validate and record under the auction lock;
        //    every accepted bid restarts the countdown
        let caller = metadata.caller.clone();
        let timers = &self.timers;
        let committed = self
            .executor
            .execute_and(
                cmd.auction_id,
                move |floor| {
                    floor.authorize_bid(&caller, &cmd.bidder_id)?;
                    floor.place_bid(cmd.bidder_id, cmd.player_id, cmd.amount, Timestamp::now())
                },
                |placed, version| {
                    if !placed.duplicate {
                        timers.dispatch(
                            cmd.auction_id,
                            version,
                            TimerCommand::Reset {
                                player_id: cmd.player_id,
                            },
                        );
                    }
                },
            )
            .await?;

        Ok(PlaceBidResult {
            bid: committed.value.bid,
            duplicate: committed.value.duplicate,
            version: committed.version,
        })
    }
}
