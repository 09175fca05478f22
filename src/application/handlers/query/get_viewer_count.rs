//! GetViewerCountHandler - current presence count.

use std::sync::Arc;

use crate::application::presence::PresenceService;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::AuctionId;

#[derive(Debug, Clone)]
pub struct GetViewerCountQuery {
    pub auction_id: AuctionId,
}

pub struct GetViewerCountHandler {
    presence: Arc<PresenceService>,
}

impl GetViewerCountHandler {
    pub fn new(presence: Arc<PresenceService>) -> Self {
        Self { presence }
    }

    pub async fn handle(&self, query: GetViewerCountQuery) -> Result<u64, AuctionError> {
        self.presence.count(query.auction_id).await
    }
}
