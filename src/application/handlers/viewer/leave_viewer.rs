//! LeaveViewerHandler - a viewer closed the live feed.

use std::sync::Arc;

use crate::application::presence::PresenceService;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, ViewerId};

#[derive(Debug, Clone)]
pub struct LeaveViewerCommand {
    pub auction_id: AuctionId,
    pub viewer_id: ViewerId,
}

pub struct LeaveViewerHandler {
    presence: Arc<PresenceService>,
}

impl LeaveViewerHandler {
    pub fn new(presence: Arc<PresenceService>) -> Self {
        Self { presence }
    }

    /// Returns the new absolute count, floored at zero.
    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id, viewer_id = %cmd.viewer_id))]
    pub async fn handle(&self, cmd: LeaveViewerCommand) -> Result<u64, AuctionError> {
        let change = self.presence.leave(cmd.auction_id, &cmd.viewer_id).await?;
        Ok(change.count)
    }
}
