//! Serialized unit of work per auction.
//!
//! Every state-changing operation runs as: take the auction's lock, load the
//! floor, apply the domain operation, commit with a version check, release
//! the lock, then publish. The lock is an owned guard, so dropping the
//! request future at any await point releases it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::auction::AuctionError;
use crate::domain::floor::{AuctionEvent, AuctionFloor};
use crate::domain::foundation::AuctionId;
use crate::ports::AuctionStore;

use super::gateway::BroadcastGateway;

/// One async mutex per auction, created on first use.
pub struct AuctionLocks {
    locks: Mutex<HashMap<AuctionId, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
}

impl AuctionLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Waits at most the lock timeout.
    ///
    /// # Errors
    ///
    /// - `Timeout` (retryable) if the lock stays held past the timeout
    pub async fn acquire(&self, auction_id: AuctionId) -> Result<OwnedMutexGuard<()>, AuctionError> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(auction_id).or_default())
        };
        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| AuctionError::timeout("auction lock"))
    }

    /// Drops locks nobody holds or waits on.
    pub fn prune(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a committed operation returned, at which version, with which events.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub value: T,
    pub version: u64,
    pub events: Vec<AuctionEvent>,
}

pub struct FloorExecutor {
    store: Arc<dyn AuctionStore>,
    gateway: Arc<BroadcastGateway>,
    locks: AuctionLocks,
    store_timeout: Duration,
}

impl FloorExecutor {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        gateway: Arc<BroadcastGateway>,
        lock_timeout: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            locks: AuctionLocks::new(lock_timeout),
            store_timeout,
        }
    }

    pub fn locks(&self) -> &AuctionLocks {
        &self.locks
    }

    /// Runs `op` against a freshly loaded floor under the auction's lock.
    ///
    /// Nothing is written if `op` fails or changes nothing. Events are
    /// published only after a successful commit and after the lock is gone.
    pub async fn execute<T, F>(&self, auction_id: AuctionId, op: F) -> Result<Committed<T>, AuctionError>
    where
        F: FnOnce(&mut AuctionFloor) -> Result<T, AuctionError> + Send,
        T: Send,
    {
        self.execute_and(auction_id, op, |_, _| {}).await
    }

    /// Like [`execute`](Self::execute), and calls `on_commit` with the value
    /// and committed version while the lock is still held.
    ///
    /// `on_commit` must not block. Side effects it starts are ordered with
    /// the auction's commits.
    pub async fn execute_and<T, F, C>(
        &self,
        auction_id: AuctionId,
        op: F,
        on_commit: C,
    ) -> Result<Committed<T>, AuctionError>
    where
        F: FnOnce(&mut AuctionFloor) -> Result<T, AuctionError> + Send,
        C: FnOnce(&T, u64) + Send,
        T: Send,
    {
        let guard = self.locks.acquire(auction_id).await?;

        let mut floor = self.load(auction_id).await?;
        let value = op(&mut floor).map_err(|e| {
            tracing::debug!(auction_id = %auction_id, code = %e.code(), error = %e, "Operation rejected");
            e
        })?;
        let events = floor.take_events();

        let version = if floor.changes().is_empty() {
            floor.version()
        } else {
            let version = tokio::time::timeout(self.store_timeout, self.store.commit(&floor))
                .await
                .map_err(|_| AuctionError::timeout("auction store commit"))??;
            floor.mark_committed(version);
            tracing::info!(
                auction_id = %auction_id,
                version,
                events = events.len(),
                "Floor committed"
            );
            version
        };

        on_commit(&value, version);
        drop(guard);
        self.gateway
            .publish_floor_events(auction_id, version, &events)
            .await;

        Ok(Committed {
            value,
            version,
            events,
        })
    }

    /// Lock-free read of the current floor.
    pub async fn load(&self, auction_id: AuctionId) -> Result<AuctionFloor, AuctionError> {
        tokio::time::timeout(self.store_timeout, self.store.load(&auction_id))
            .await
            .map_err(|_| AuctionError::timeout("auction store load"))??
            .ok_or(AuctionError::AuctionNotFound(auction_id))
    }

    /// Stores a new floor.
    pub async fn insert(&self, floor: &AuctionFloor) -> Result<(), AuctionError> {
        tokio::time::timeout(self.store_timeout, self.store.insert(floor))
            .await
            .map_err(|_| AuctionError::timeout("auction store insert"))??;
        Ok(())
    }
}
