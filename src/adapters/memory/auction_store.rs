//! In-memory auction store for tests and single-process runs.
//!
//! Applies the same compare-and-swap on version as the Postgres store, so
//! concurrency tests exercise the real conflict path.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::floor::AuctionFloor;
use crate::domain::foundation::{AuctionId, DomainError, ErrorCode};
use crate::ports::AuctionStore;

#[derive(Default)]
pub struct InMemoryAuctionStore {
    floors: RwLock<HashMap<AuctionId, AuctionFloor>>,
    commits: AtomicUsize,
    fail_commits: AtomicBool,
    commit_delay: RwLock<Option<Duration>>,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Makes every following commit fail with `DatabaseError`.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Delays every following commit, for timeout tests.
    pub async fn delay_commits(&self, delay: Option<Duration>) {
        *self.commit_delay.write().await = delay;
    }

    /// Overwrites the stored floor, bumping its version as a foreign writer
    /// would.
    pub async fn force_write(&self, floor: &AuctionFloor) {
        let mut floors = self.floors.write().await;
        let version = floors
            .get(floor.auction().id())
            .map_or(0, |stored| stored.version() + 1);
        floors.insert(*floor.auction().id(), snapshot(floor, version));
    }
}

/// Stored copy without pending events or dirty marks.
fn snapshot(floor: &AuctionFloor, version: u64) -> AuctionFloor {
    AuctionFloor::restore(
        floor.auction().clone(),
        floor.players().to_vec(),
        floor.bidders().to_vec(),
        version,
    )
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn load(&self, auction_id: &AuctionId) -> Result<Option<AuctionFloor>, DomainError> {
        Ok(self.floors.read().await.get(auction_id).cloned())
    }

    async fn insert(&self, floor: &AuctionFloor) -> Result<(), DomainError> {
        let mut floors = self.floors.write().await;
        let id = *floor.auction().id();
        if floors.contains_key(&id) {
            return Err(DomainError::new(
                ErrorCode::VersionConflict,
                format!("Auction already exists: {}", id),
            ));
        }
        floors.insert(id, snapshot(floor, 0));
        Ok(())
    }

    async fn commit(&self, floor: &AuctionFloor) -> Result<u64, DomainError> {
        let delay = *self.commit_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Failed to commit auction: store unavailable",
            ));
        }

        let mut floors = self.floors.write().await;
        let id = *floor.auction().id();
        let stored = floors.get(&id).ok_or_else(|| {
            DomainError::new(ErrorCode::AuctionNotFound, format!("Auction not found: {}", id))
        })?;
        if stored.version() != floor.version() {
            return Err(DomainError::version_conflict(floor.version()));
        }

        let version = floor.version() + 1;
        floors.insert(id, snapshot(floor, version));
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auction::{Auction, AuctionRules};
    use crate::domain::bidder::Bidder;
    use crate::domain::foundation::{Amount, BidderId, Timestamp, UserId};

    fn floor() -> AuctionFloor {
        let id = AuctionId::new();
        let auction =
            Auction::new(id, UserId::new("admin").unwrap(), "Spring draft", AuctionRules::default())
                .unwrap();
        let bidders = (0..2)
            .map(|n| {
                Bidder::new(BidderId::new(), id, format!("Bidder {}", n), None, Amount::new(1_000))
                    .unwrap()
            })
            .collect();
        AuctionFloor::new(auction, vec![], bidders).unwrap()
    }

    #[tokio::test]
    async fn commit_bumps_version_once() {
        let store = InMemoryAuctionStore::new();
        let floor = floor();
        store.insert(&floor).await.unwrap();

        let mut loaded = store.load(floor.auction().id()).await.unwrap().unwrap();
        loaded
            .update_rules(AuctionRules::default(), Timestamp::now())
            .unwrap();
        assert_eq!(store.commit(&loaded).await.unwrap(), 1);
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn stale_commit_is_a_version_conflict() {
        let store = InMemoryAuctionStore::new();
        let floor = floor();
        store.insert(&floor).await.unwrap();

        let first = store.load(floor.auction().id()).await.unwrap().unwrap();
        let second = first.clone();
        store.commit(&first).await.unwrap();

        let err = store.commit(&second).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::VersionConflict);
    }

    #[tokio::test]
    async fn stored_copy_has_no_pending_events() {
        let store = InMemoryAuctionStore::new();
        let mut floor = floor();
        store.insert(&floor).await.unwrap();
        floor.publish(Timestamp::now()).unwrap();
        assert_eq!(floor.pending_events().len(), 1);
        store.commit(&floor).await.unwrap();

        let loaded = store.load(floor.auction().id()).await.unwrap().unwrap();
        assert!(loaded.pending_events().is_empty());
        assert!(loaded.changes().is_empty());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = InMemoryAuctionStore::new();
        let floor = floor();
        store.insert(&floor).await.unwrap();
        assert!(store.insert(&floor).await.is_err());
    }

    #[tokio::test]
    async fn failing_store_reports_database_error() {
        let store = InMemoryAuctionStore::new();
        let floor = floor();
        store.insert(&floor).await.unwrap();
        store.fail_commits(true);
        let err = store.commit(&floor).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
