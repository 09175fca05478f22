//! GetAuctionStateHandler - authoritative snapshot for clients that missed
//! notifications.

use std::sync::Arc;

use serde::Serialize;

use crate::application::executor::FloorExecutor;
use crate::application::presence::PresenceService;
use crate::application::timer::TimerCoordinator;
use crate::domain::auction::AuctionError;
use crate::domain::floor::FloorView;
use crate::domain::foundation::AuctionId;
use crate::domain::timer::Countdown;

#[derive(Debug, Clone)]
pub struct GetAuctionStateQuery {
    pub auction_id: AuctionId,
}

/// Floor view plus the two side-channel values a client renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionState {
    #[serde(flatten)]
    pub floor: FloorView,
    pub countdown: Option<Countdown>,
    /// `None` if the presence store could not answer in time.
    pub viewer_count: Option<u64>,
}

pub struct GetAuctionStateHandler {
    executor: Arc<FloorExecutor>,
    timers: Arc<TimerCoordinator>,
    presence: Arc<PresenceService>,
}

impl GetAuctionStateHandler {
    pub fn new(
        executor: Arc<FloorExecutor>,
        timers: Arc<TimerCoordinator>,
        presence: Arc<PresenceService>,
    ) -> Self {
        Self {
            executor,
            timers,
            presence,
        }
    }

    /// Does not take the auction lock.
    pub async fn handle(&self, query: GetAuctionStateQuery) -> Result<AuctionState, AuctionError> {
        let floor = self.executor.load(query.auction_id).await?;

        let viewer_count = match self.presence.count(query.auction_id).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!(auction_id = %query.auction_id, error = %e, "Viewer count unavailable");
                None
            }
        };

        Ok(AuctionState {
            floor: floor.view(),
            countdown: self.timers.snapshot(query.auction_id),
            viewer_count,
        })
    }
}
