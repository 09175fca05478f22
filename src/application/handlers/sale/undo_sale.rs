//! UndoSaleHandler - Command handler for reversing the most recent sale.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::application::timer::TimerCoordinator;
use crate::domain::auction::{AuctionError, AuctionStatus};
use crate::domain::floor::SaleUndone;
use crate::domain::foundation::{AuctionId, CommandMetadata, PlayerId, Timestamp};
use crate::domain::timer::TimerCommand;

#[derive(Debug, Clone)]
pub struct UndoSaleCommand {
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoSaleResult {
    pub undone: SaleUndone,
    pub version: u64,
}

/// SOLD -> IN_BIDDING with the purse credit in the same commit. The player
/// gets a fresh countdown, held if the auction is paused.
pub struct UndoSaleHandler {
    executor: Arc<FloorExecutor>,
    timers: Arc<TimerCoordinator>,
}

impl UndoSaleHandler {
    pub fn new(executor: Arc<FloorExecutor>, timers: Arc<TimerCoordinator>) -> Self {
        Self { executor, timers }
    }

    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id, player_id = %cmd.player_id))]
    pub async fn handle(
        &self,
        cmd: UndoSaleCommand,
        metadata: CommandMetadata,
    ) -> Result<UndoSaleResult, AuctionError> {
        let caller = metadata.caller.clone();
        let timers = &self.timers;
        let committed = self
            .executor
            .execute_and(
                cmd.auction_id,
                move |floor| {
                    floor.authorize_admin(&caller)?;
                    let undone = floor.undo_sale(cmd.player_id, Timestamp::now())?;
                    let auction = floor.auction();
                    Ok((
                        undone,
                        auction.rules().countdown_seconds,
                        auction.status() == AuctionStatus::Paused,
                    ))
                },
                |(_, seconds, paused): &(SaleUndone, u32, bool), version| {
                    timers.dispatch(
                        cmd.auction_id,
                        version,
                        TimerCommand::Start {
                            player_id: cmd.player_id,
                            seconds: *seconds,
                            frozen: *paused,
                        },
                    );
                },
            )
            .await?;
        let (undone, _, _) = committed.value;

        Ok(UndoSaleResult {
            undone,
            version: committed.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::bidding::{PlaceBidCommand, PlaceBidHandler};
    use crate::application::handlers::sale::{MarkSoldCommand, MarkSoldHandler};
    use crate::application::test_support::{admin, harness, Harness, Seeded, PURSE};
    use crate::domain::foundation::Amount;
    use crate::domain::player::PlayerStatus;
    use crate::domain::timer::CountdownState;

    async fn sell_first_player(h: &Harness, s: &Seeded, amount: u64) {
        PlaceBidHandler::new(h.executor.clone(), h.timers.clone())
            .handle(
                PlaceBidCommand {
                    auction_id: s.auction_id,
                    player_id: s.players[0],
                    bidder_id: s.bidders[0],
                    amount: Amount::new(amount),
                },
                admin(),
            )
            .await
            .unwrap();
        MarkSoldHandler::new(h.executor.clone(), h.timers.clone(), h.gateway.clone())
            .handle(
                MarkSoldCommand {
                    auction_id: s.auction_id,
                    player_id: s.players[0],
                    bidder_id: s.bidders[0],
                    amount: Amount::new(amount),
                    override_bid: false,
                },
                admin(),
            )
            .await
            .unwrap();
    }

    fn undo(s: &Seeded) -> UndoSaleCommand {
        UndoSaleCommand {
            auction_id: s.auction_id,
            player_id: s.players[0],
        }
    }

    #[tokio::test]
    async fn undo_restores_the_exact_purse_and_the_sold_bid() {
        let h = harness();
        let s = h.bidding(2, 2).await;
        sell_first_player(&h, &s, 600).await;

        let result = UndoSaleHandler::new(h.executor.clone(), h.timers.clone())
            .handle(undo(&s), admin())
            .await
            .unwrap();

        assert_eq!(result.undone.amount, Amount::new(600));
        assert_eq!(result.undone.remaining_purse, Amount::new(PURSE));
        let floor = h.floor(s.auction_id).await;
        let player = floor.player(&s.players[0]).unwrap();
        assert_eq!(player.status(), PlayerStatus::InBidding);
        assert_eq!(player.current_bid().map(|b| b.amount), Some(Amount::new(600)));
        assert!(player.sold_price().is_none());
        assert_eq!(floor.bidder(&s.bidders[0]).unwrap().remaining_purse(), Amount::new(PURSE));
        assert!(h.broadcaster.last_named("sale-undo").is_some());
    }

    #[tokio::test]
    async fn second_undo_has_nothing_to_undo() {
        let h = harness();
        let s = h.bidding(2, 2).await;
        sell_first_player(&h, &s, 600).await;
        let handler = UndoSaleHandler::new(h.executor.clone(), h.timers.clone());
        handler.handle(undo(&s), admin()).await.unwrap();

        let err = handler.handle(undo(&s), admin()).await.unwrap_err();

        assert!(matches!(err, AuctionError::NothingToUndo(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn undo_while_paused_starts_a_frozen_countdown() {
        let h = harness();
        let s = h.bidding(2, 2).await;
        sell_first_player(&h, &s, 600).await;
        h.executor
            .execute(s.auction_id, |floor| floor.pause(Timestamp::now()))
            .await
            .unwrap();

        UndoSaleHandler::new(h.executor.clone(), h.timers.clone())
            .handle(undo(&s), admin())
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let countdown = h.timers.snapshot(s.auction_id).unwrap();
        assert_eq!(countdown.player_id(), s.players[0]);
        assert_eq!(countdown.state(), CountdownState::Frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn undo_right_after_a_sale_keeps_the_new_countdown() {
        let h = harness();
        let s = h.bidding(2, 2).await;
        let version = h.floor(s.auction_id).await.version();
        h.timers.dispatch(
            s.auction_id,
            version,
            TimerCommand::Start {
                player_id: s.players[0],
                seconds: 30,
                frozen: false,
            },
        );
        sell_first_player(&h, &s, 600).await;
        UndoSaleHandler::new(h.executor.clone(), h.timers.clone())
            .handle(undo(&s), admin())
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;

        let countdown = h.timers.snapshot(s.auction_id).unwrap();
        assert_eq!(countdown.player_id(), s.players[0]);
        assert_eq!(countdown.state(), CountdownState::Running);
    }
}
