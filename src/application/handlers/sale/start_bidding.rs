//! StartBiddingHandler - Command handler for putting a player up for bids.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::application::timer::TimerCoordinator;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, CommandMetadata, PlayerId, Timestamp};
use crate::domain::player::Player;
use crate::domain::timer::TimerCommand;

#[derive(Debug, Clone)]
pub struct StartBiddingCommand {
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartBiddingResult {
    pub player: Player,
    pub countdown_seconds: u32,
    pub version: u64,
}

/// Moves an AVAILABLE player into bidding and starts its countdown.
pub struct StartBiddingHandler {
    executor: Arc<FloorExecutor>,
    timers: Arc<TimerCoordinator>,
}

impl StartBiddingHandler {
    pub fn new(executor: Arc<FloorExecutor>, timers: Arc<TimerCoordinator>) -> Self {
        Self { executor, timers }
    }

    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id, player_id = %cmd.player_id))]
    pub async fn handle(
        &self,
        cmd: StartBiddingCommand,
        metadata: CommandMetadata,
    ) -> Result<StartBiddingResult, AuctionError> {
        // Claim the auction's single active slot and start its countdown
        let caller = metadata.caller.clone();
        let timers = &self.timers;
        let committed = self
            .executor
            .execute_and(
                cmd.auction_id,
                move |floor| {
                    floor.authorize_admin(&caller)?;
                    let player = floor.start_bidding(cmd.player_id, Timestamp::now())?;
                    Ok((player, floor.auction().rules().countdown_seconds))
                },
                |(_, seconds): &(Player, u32), version| {
                    timers.dispatch(
                        cmd.auction_id,
                        version,
                        TimerCommand::Start {
                            player_id: cmd.player_id,
                            seconds: *seconds,
                            frozen: false,
                        },
                    );
                },
            )
            .await?;
        let (player, countdown_seconds) = committed.value;

        Ok(StartBiddingResult {
            player,
            countdown_seconds,
            version: committed.version,
        })
    }
}
