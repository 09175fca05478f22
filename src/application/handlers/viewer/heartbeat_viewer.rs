//! HeartbeatViewerHandler - keeps a viewer session alive.

use std::sync::Arc;

use crate::application::presence::PresenceService;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, Timestamp, ViewerId};

#[derive(Debug, Clone)]
pub struct HeartbeatViewerCommand {
    pub auction_id: AuctionId,
    pub viewer_id: ViewerId,
}

/// A heartbeat from an expired or unknown session rejoins it.
pub struct HeartbeatViewerHandler {
    presence: Arc<PresenceService>,
}

impl HeartbeatViewerHandler {
    pub fn new(presence: Arc<PresenceService>) -> Self {
        Self { presence }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(auction_id = %cmd.auction_id))]
    pub async fn handle(&self, cmd: HeartbeatViewerCommand) -> Result<u64, AuctionError> {
        let change = self
            .presence
            .heartbeat(cmd.auction_id, &cmd.viewer_id, Timestamp::now())
            .await?;
        Ok(change.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::harness;

    #[tokio::test]
    async fn heartbeat_keeps_a_session_through_the_sweep() {
        let h = harness();
        let auction_id = AuctionId::new();
        let (quiet, chatty) = (ViewerId::new("quiet").unwrap(), ViewerId::new("chatty").unwrap());
        let joined_at = Timestamp::now().minus_secs(60);
        h.presence.join(auction_id, &quiet, joined_at).await.unwrap();
        h.presence.join(auction_id, &chatty, joined_at).await.unwrap();

        HeartbeatViewerHandler::new(h.presence.clone())
            .handle(HeartbeatViewerCommand {
                auction_id,
                viewer_id: chatty,
            })
            .await
            .unwrap();
        let expired = h.presence.sweep(auction_id, Timestamp::now()).await.unwrap();

        assert_eq!(expired, 1);
        assert_eq!(h.presence.count(auction_id).await.unwrap(), 1);
    }
}
