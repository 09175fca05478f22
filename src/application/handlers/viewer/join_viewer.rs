//! JoinViewerHandler - a viewer opened the live feed.

use std::sync::Arc;

use crate::application::presence::PresenceService;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, Timestamp, ViewerId};

#[derive(Debug, Clone)]
pub struct JoinViewerCommand {
    pub auction_id: AuctionId,
    pub viewer_id: ViewerId,
}

pub struct JoinViewerHandler {
    presence: Arc<PresenceService>,
}

impl JoinViewerHandler {
    pub fn new(presence: Arc<PresenceService>) -> Self {
        Self { presence }
    }

    /// Returns the new absolute count. Joining twice counts once.
    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id, viewer_id = %cmd.viewer_id))]
    pub async fn handle(&self, cmd: JoinViewerCommand) -> Result<u64, AuctionError> {
        let change = self
            .presence
            .join(cmd.auction_id, &cmd.viewer_id, Timestamp::now())
            .await?;
        Ok(change.count)
    }
}
