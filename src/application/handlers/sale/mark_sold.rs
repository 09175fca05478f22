//! MarkSoldHandler - Command handler for the sale commit.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::application::gateway::BroadcastGateway;
use crate::application::timer::TimerCoordinator;
use crate::domain::auction::{AuctionError, SaleRecord};
use crate::domain::floor::{PlayerSold, SaleTerms};
use crate::domain::foundation::{
    Amount, AuctionId, BidderId, CommandMetadata, PlayerId, Timestamp,
};
use crate::domain::timer::TimerCommand;

/// Command to sell the player in bidding.
///
/// Without `override_bid` the terms must match the current bid exactly.
#[derive(Debug, Clone)]
pub struct MarkSoldCommand {
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
    pub bidder_id: BidderId,
    pub amount: Amount,
    pub override_bid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkSoldResult {
    pub sale: SaleRecord,
    /// Winner's purse after the debit.
    pub remaining_purse: Amount,
    pub version: u64,
}

pub struct MarkSoldHandler {
    executor: Arc<FloorExecutor>,
    timers: Arc<TimerCoordinator>,
    gateway: Arc<BroadcastGateway>,
}

impl MarkSoldHandler {
    pub fn new(
        executor: Arc<FloorExecutor>,
        timers: Arc<TimerCoordinator>,
        gateway: Arc<BroadcastGateway>,
    ) -> Self {
        Self {
            executor,
            timers,
            gateway,
        }
    }

    #[tracing::instrument(
        skip_all,
        fields(
            auction_id = %cmd.auction_id,
            player_id = %cmd.player_id,
            bidder_id = %cmd.bidder_id,
            amount = %cmd.amount,
            override_bid = cmd.override_bid
        )
    )]
    pub async fn handle(
        &self,
        cmd: MarkSoldCommand,
        metadata: CommandMetadata,
    ) -> Result<MarkSoldResult, AuctionError> {
        let terms = if cmd.override_bid {
            SaleTerms::Override {
                bidder_id: cmd.bidder_id,
                amount: cmd.amount,
            }
        } else {
            SaleTerms::CurrentBid {
                bidder_id: cmd.bidder_id,
                amount: cmd.amount,
            }
        };

        // 1. Status change and purse debit commit together; the countdown
        //    for this player is over
        let caller = metadata.caller.clone();
        let timers = &self.timers;
        let committed = self
            .executor
            .execute_and(
                cmd.auction_id,
                move |floor| {
                    floor.authorize_admin(&caller)?;
                    let sale = floor.mark_sold(cmd.player_id, terms, Timestamp::now())?;
                    let winner = floor.bidder(&sale.bidder_id);
                    let remaining = winner.map(|b| b.remaining_purse()).unwrap_or_default();
                    let owner = winner.and_then(|b| b.user_id().cloned());
                    let player_name = floor
                        .player(&sale.player_id)
                        .map(|p| p.name().to_string())
                        .unwrap_or_default();
                    Ok((sale, remaining, owner, player_name))
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
        let (sale, remaining_purse, owner, player_name) = committed.value;

        // 2. Tell the winning team's account directly
        if let Some(user_id) = owner {
            self.gateway
                .notify_user(
                    &user_id,
                    &PlayerSold {
                        player_id: sale.player_id,
                        bidder_id: sale.bidder_id,
                        amount: sale.amount,
                        player_name,
                    },
                )
                .await;
        }

        Ok(MarkSoldResult {
            sale,
            remaining_purse,
            version: committed.version,
        })
    }
}
