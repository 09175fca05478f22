//! Broadcaster port - best-effort publish of event messages to channels.
//!
//! Delivery is at-most-once. Callers never let a failed publish fail the
//! state change that produced it; see `application::BroadcastGateway`.

use async_trait::async_trait;
use std::fmt;

use crate::domain::foundation::{AuctionId, DomainError, EventMessage, UserId};

/// Named broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Everyone watching an auction.
    Auction(AuctionId),
    /// Targeted notifications for one account.
    User(UserId),
}

impl Channel {
    pub fn name(&self) -> String {
        match self {
            Channel::Auction(id) => format!("auction-{}", id),
            Channel::User(id) => format!("private-user-{}", id),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Publishes one message.
    ///
    /// # Errors
    ///
    /// - `BroadcastError` or `CacheError` when the transport fails
    async fn publish(&self, channel: &Channel, message: &EventMessage) -> Result<(), DomainError>;
}
