//! Auction store port.
//!
//! The store is the authoritative record of an auction floor. Writes are a
//! compare-and-swap on the floor version: a commit succeeds only if nobody
//! else committed since the floor was loaded.

use async_trait::async_trait;

use crate::domain::floor::AuctionFloor;
use crate::domain::foundation::{AuctionId, DomainError};

/// Persistence port for [`AuctionFloor`] units.
///
/// Implementations must apply a commit atomically: the auction row, every
/// dirty player and every dirty bidder land together or not at all.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Loads the auction with all its players and bidders.
    ///
    /// Returns `None` if the auction does not exist.
    async fn load(&self, auction_id: &AuctionId) -> Result<Option<AuctionFloor>, DomainError>;

    /// Stores a freshly assembled floor at version 0.
    ///
    /// # Errors
    ///
    /// - `VersionConflict` if the auction already exists
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, floor: &AuctionFloor) -> Result<(), DomainError>;

    /// Writes the floor's dirty entities if the stored version still equals
    /// `floor.version()`, and returns the new version.
    ///
    /// # Errors
    ///
    /// - `VersionConflict` if another commit happened since load
    /// - `AuctionNotFound` if the auction row is gone
    /// - `DatabaseError` on persistence failure
    async fn commit(&self, floor: &AuctionFloor) -> Result<u64, DomainError>;
}
