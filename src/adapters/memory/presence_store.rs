//! In-memory presence store: one roster per auction plus an atomic count
//! that readers can take without the roster lock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::foundation::{AuctionId, DomainError, Timestamp, ViewerId};
use crate::domain::presence::PresenceRoster;
use crate::ports::{PresenceChange, PresenceStore, SweepOutcome};

struct AuctionPresence {
    roster: Mutex<PresenceRoster>,
    count: AtomicU64,
}

impl AuctionPresence {
    fn new(auction_id: AuctionId) -> Self {
        Self {
            roster: Mutex::new(PresenceRoster::new(auction_id)),
            count: AtomicU64::new(0),
        }
    }

    /// Publishes the roster size as the count; never an increment.
    fn settle(&self, roster: &PresenceRoster) -> u64 {
        let count = roster.count() as u64;
        self.count.store(count, Ordering::SeqCst);
        count
    }
}

#[derive(Default)]
pub struct InMemoryPresenceStore {
    auctions: std::sync::RwLock<HashMap<AuctionId, Arc<AuctionPresence>>>,
}

impl InMemoryPresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, auction_id: &AuctionId) -> Option<Arc<AuctionPresence>> {
        self.auctions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(auction_id)
            .map(Arc::clone)
    }

    fn presence(&self, auction_id: &AuctionId) -> Arc<AuctionPresence> {
        if let Some(presence) = self.lookup(auction_id) {
            return presence;
        }
        let mut auctions = self
            .auctions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            auctions
                .entry(*auction_id)
                .or_insert_with(|| Arc::new(AuctionPresence::new(*auction_id))),
        )
    }

    /// Forgets an auction whose roster is empty. Call with the roster lock
    /// held; an entry another caller has already cloned stays.
    fn forget_if_empty(
        &self,
        auction_id: &AuctionId,
        presence: &Arc<AuctionPresence>,
        roster: &PresenceRoster,
    ) {
        if roster.count() > 0 {
            return;
        }
        let mut auctions = self
            .auctions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let unshared = auctions.get(auction_id).map_or(false, |stored| {
            Arc::ptr_eq(stored, presence) && Arc::strong_count(stored) == 2
        });
        if unshared {
            auctions.remove(auction_id);
        }
    }

    /// Auctions with an entry, watched or not.
    pub fn auction_entries(&self) -> usize {
        self.auctions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl PresenceStore for InMemoryPresenceStore {
    async fn join(
        &self,
        auction_id: &AuctionId,
        viewer_id: &ViewerId,
        now: Timestamp,
    ) -> Result<PresenceChange, DomainError> {
        let presence = self.presence(auction_id);
        let mut roster = presence.roster.lock().await;
        let changed = roster.join(viewer_id.clone(), now);
        Ok(PresenceChange {
            count: presence.settle(&roster),
            changed,
        })
    }

    async fn leave(
        &self,
        auction_id: &AuctionId,
        viewer_id: &ViewerId,
    ) -> Result<PresenceChange, DomainError> {
        let Some(presence) = self.lookup(auction_id) else {
            return Ok(PresenceChange {
                count: 0,
                changed: false,
            });
        };
        let mut roster = presence.roster.lock().await;
        let changed = roster.leave(viewer_id);
        let count = presence.settle(&roster);
        self.forget_if_empty(auction_id, &presence, &roster);
        Ok(PresenceChange { count, changed })
    }

    async fn heartbeat(
        &self,
        auction_id: &AuctionId,
        viewer_id: &ViewerId,
        now: Timestamp,
    ) -> Result<PresenceChange, DomainError> {
        let presence = self.presence(auction_id);
        let mut roster = presence.roster.lock().await;
        let changed = roster.heartbeat(viewer_id.clone(), now);
        Ok(PresenceChange {
            count: presence.settle(&roster),
            changed,
        })
    }

    async fn sweep(
        &self,
        auction_id: &AuctionId,
        cutoff: Timestamp,
    ) -> Result<SweepOutcome, DomainError> {
        let Some(presence) = self.lookup(auction_id) else {
            return Ok(SweepOutcome {
                expired: Vec::new(),
                count: 0,
            });
        };
        let mut roster = presence.roster.lock().await;
        let expired = roster.expire(cutoff);
        let count = presence.settle(&roster);
        self.forget_if_empty(auction_id, &presence, &roster);
        Ok(SweepOutcome { expired, count })
    }

    async fn count(&self, auction_id: &AuctionId) -> Result<u64, DomainError> {
        Ok(self
            .lookup(auction_id)
            .map_or(0, |presence| presence.count.load(Ordering::SeqCst)))
    }

    async fn tracked_auctions(&self) -> Result<Vec<AuctionId>, DomainError> {
        let auctions = self
            .auctions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(auctions
            .iter()
            .filter(|(_, presence)| presence.count.load(Ordering::SeqCst) > 0)
            .map(|(id, _)| *id)
            .collect())
    }
}
