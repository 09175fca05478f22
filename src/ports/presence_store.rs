//! Presence store port - who is watching which auction.
//!
//! Counts are absolute. A join for a viewer already present, or a leave for
//! one already gone, reports `changed: false` and leaves the count alone.

use async_trait::async_trait;

use crate::domain::foundation::{AuctionId, DomainError, Timestamp, ViewerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceChange {
    /// Viewer count after the call.
    pub count: u64,
    /// Whether membership changed.
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    pub expired: Vec<ViewerId>,
    pub count: u64,
}

#[async_trait]
pub trait PresenceStore: Send + Sync {
    async fn join(
        &self,
        auction_id: &AuctionId,
        viewer_id: &ViewerId,
        now: Timestamp,
    ) -> Result<PresenceChange, DomainError>;

    async fn leave(
        &self,
        auction_id: &AuctionId,
        viewer_id: &ViewerId,
    ) -> Result<PresenceChange, DomainError>;

    /// Refreshes a viewer's liveness. An unknown viewer is joined.
    async fn heartbeat(
        &self,
        auction_id: &AuctionId,
        viewer_id: &ViewerId,
        now: Timestamp,
    ) -> Result<PresenceChange, DomainError>;

    /// Drops viewers whose last heartbeat is older than `cutoff`.
    async fn sweep(
        &self,
        auction_id: &AuctionId,
        cutoff: Timestamp,
    ) -> Result<SweepOutcome, DomainError>;

    async fn count(&self, auction_id: &AuctionId) -> Result<u64, DomainError>;

    /// Auctions with at least one tracked viewer.
    async fn tracked_auctions(&self) -> Result<Vec<AuctionId>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn PresenceStore) {}
    }
}
