//! ResumeAuctionHandler - PAUSED -> LIVE.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::application::timer::TimerCoordinator;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, CommandMetadata, Timestamp};
use crate::domain::timer::TimerCommand;

use super::LifecycleResult;

#[derive(Debug, Clone)]
pub struct ResumeAuctionCommand {
    pub auction_id: AuctionId,
}

/// Reopens bidding; the countdown continues from its held value.
pub struct ResumeAuctionHandler {
    executor: Arc<FloorExecutor>,
    timers: Arc<TimerCoordinator>,
}

impl ResumeAuctionHandler {
    pub fn new(executor: Arc<FloorExecutor>, timers: Arc<TimerCoordinator>) -> Self {
        Self { executor, timers }
    }

    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id))]
    pub async fn handle(
        &self,
        cmd: ResumeAuctionCommand,
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
                    floor.resume(Timestamp::now())?;
                    Ok(floor.auction().status())
                },
                |_, version| {
                    timers.dispatch(cmd.auction_id, version, TimerCommand::Resume);
                },
            )
            .await?;

        Ok(LifecycleResult {
            status: committed.value,
            version: committed.version,
        })
    }
}
