//! Viewer presence: join/leave/heartbeat with absolute count broadcasts, and
//! the periodic liveness sweep.
//!
//! Presence never takes the auction lock. Every call that changes the count
//! publishes `viewer-count-update` with the new absolute value.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, DomainError, Timestamp, ViewerId};
use crate::domain::presence::ViewerCountUpdate;
use crate::ports::{PresenceChange, PresenceStore};

use super::gateway::BroadcastGateway;

/// Totals from one pass over every tracked auction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub auctions: usize,
    pub expired: usize,
    pub failed: usize,
}

pub struct PresenceService {
    store: Arc<dyn PresenceStore>,
    gateway: Arc<BroadcastGateway>,
    store_timeout: Duration,
    heartbeat_timeout: Duration,
}

impl PresenceService {
    pub fn new(
        store: Arc<dyn PresenceStore>,
        gateway: Arc<BroadcastGateway>,
        store_timeout: Duration,
        heartbeat_timeout: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            store_timeout,
            heartbeat_timeout,
        }
    }

    pub async fn join(
        &self,
        auction_id: AuctionId,
        viewer_id: &ViewerId,
        now: Timestamp,
    ) -> Result<PresenceChange, AuctionError> {
        let change = self
            .bounded("presence join", self.store.join(&auction_id, viewer_id, now))
            .await?;
        self.announce(auction_id, change).await;
        Ok(change)
    }

    /// Count never goes below zero; a repeated leave changes nothing.
    pub async fn leave(
        &self,
        auction_id: AuctionId,
        viewer_id: &ViewerId,
    ) -> Result<PresenceChange, AuctionError> {
        let change = self
            .bounded("presence leave", self.store.leave(&auction_id, viewer_id))
            .await?;
        self.announce(auction_id, change).await;
        Ok(change)
    }

    pub async fn heartbeat(
        &self,
        auction_id: AuctionId,
        viewer_id: &ViewerId,
        now: Timestamp,
    ) -> Result<PresenceChange, AuctionError> {
        let change = self
            .bounded(
                "presence heartbeat",
                self.store.heartbeat(&auction_id, viewer_id, now),
            )
            .await?;
        self.announce(auction_id, change).await;
        Ok(change)
    }

    pub async fn count(&self, auction_id: AuctionId) -> Result<u64, AuctionError> {
        self.bounded("presence count", self.store.count(&auction_id))
            .await
    }

    /// Expires one auction's silent viewers and recomputes its count.
    pub async fn sweep(&self, auction_id: AuctionId, now: Timestamp) -> Result<usize, AuctionError> {
        let cutoff = now.minus_secs(self.heartbeat_timeout.as_secs());
        let outcome = self
            .bounded("presence sweep", self.store.sweep(&auction_id, cutoff))
            .await?;
        if !outcome.expired.is_empty() {
            tracing::info!(
                auction_id = %auction_id,
                expired = outcome.expired.len(),
                count = outcome.count,
                "Expired silent viewers"
            );
            self.gateway
                .publish_event(auction_id, &ViewerCountUpdate { count: outcome.count })
                .await;
        }
        Ok(outcome.expired.len())
    }

    /// Sweeps every tracked auction; one auction failing does not stop the
    /// rest.
    pub async fn sweep_all(&self, now: Timestamp) -> Result<SweepReport, AuctionError> {
        let auctions = self
            .bounded("presence tracked auctions", self.store.tracked_auctions())
            .await?;
        let mut report = SweepReport {
            auctions: auctions.len(),
            ..Default::default()
        };
        for auction_id in auctions {
            match self.sweep(auction_id, now).await {
                Ok(expired) => report.expired += expired,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(auction_id = %auction_id, error = %e, "Presence sweep failed");
                }
            }
        }
        Ok(report)
    }

    async fn announce(&self, auction_id: AuctionId, change: PresenceChange) {
        if change.changed {
            self.gateway
                .publish_event(auction_id, &ViewerCountUpdate { count: change.count })
                .await;
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl std::future::Future<Output = Result<T, DomainError>>,
    ) -> Result<T, AuctionError> {
        time::timeout(self.store_timeout, call)
            .await
            .map_err(|_| AuctionError::timeout(operation))?
            .map_err(AuctionError::from)
    }
}

/// Background task running [`PresenceService::sweep_all`] on an interval.
pub struct PresenceSweeper {
    presence: Arc<PresenceService>,
    interval: Duration,
}

impl PresenceSweeper {
    pub fn new(presence: Arc<PresenceService>, interval: Duration) -> Self {
        Self { presence, interval }
    }

    /// Runs until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Presence sweeper stopping");
                        return;
                    }
                }
                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }

    pub async fn sweep_once(&self) -> SweepReport {
        match self.presence.sweep_all(Timestamp::now()).await {
            Ok(report) => {
                if report.expired > 0 || report.failed > 0 {
                    tracing::debug!(?report, "Presence sweep finished");
                }
                report
            }
            Err(e) => {
                tracing::warn!(error = %e, "Presence sweep could not list auctions");
                SweepReport::default()
            }
        }
    }
}
