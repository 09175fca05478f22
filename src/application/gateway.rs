//! Broadcast gateway: the only way the engine publishes.
//!
//! Every publish is bounded by a timeout. Failures and timeouts are logged
//! at `warn` and swallowed; the store stays authoritative and clients
//! re-fetch state when they notice a gap.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::floor::AuctionEvent;
use crate::domain::foundation::{AuctionId, BroadcastEvent, EventMessage, UserId};
use crate::ports::{Broadcaster, Channel};

pub struct BroadcastGateway {
    broadcaster: Arc<dyn Broadcaster>,
    timeout: Duration,
}

impl BroadcastGateway {
    pub fn new(broadcaster: Arc<dyn Broadcaster>, timeout: Duration) -> Self {
        Self {
            broadcaster,
            timeout,
        }
    }

    /// Publishes one message. Returns whether it was handed off.
    pub async fn publish(&self, channel: &Channel, message: &EventMessage) -> bool {
        match tokio::time::timeout(self.timeout, self.broadcaster.publish(channel, message)).await
        {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(
                    channel = %channel,
                    event = %message.event,
                    error = %e,
                    "Broadcast failed"
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    channel = %channel,
                    event = %message.event,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Broadcast timed out"
                );
                false
            }
        }
    }

    /// Publishes an unversioned event (timer, presence) on an auction channel.
    pub async fn publish_event<E: BroadcastEvent>(&self, auction_id: AuctionId, event: &E) -> bool {
        match event.to_message() {
            Ok(message) => self.publish(&Channel::Auction(auction_id), &message).await,
            Err(e) => {
                tracing::warn!(event = event.event_name(), error = %e, "Event encoding failed");
                false
            }
        }
    }

    /// Targeted notification to one account.
    pub async fn notify_user<E: BroadcastEvent>(&self, user_id: &UserId, event: &E) -> bool {
        match event.to_message() {
            Ok(message) => self.publish(&Channel::User(user_id.clone()), &message).await,
            Err(e) => {
                tracing::warn!(event = event.event_name(), error = %e, "Event encoding failed");
                false
            }
        }
    }

    /// Publishes the events of one commit, each stamped with its version.
    pub async fn publish_floor_events(
        &self,
        auction_id: AuctionId,
        version: u64,
        events: &[AuctionEvent],
    ) {
        let channel = Channel::Auction(auction_id);
        for event in events {
            match event.to_message(version) {
                Ok(message) => {
                    self.publish(&channel, &message).await;
                }
                Err(e) => {
                    tracing::warn!(event = event.event_name(), error = %e, "Event encoding failed");
                }
            }
        }
    }
}
