//! Live feed rooms, one per broadcast channel.
//!
//! ```text
//! Room: auction-7f3…           Room: private-user-u-42
//! ├── client-a                 └── client-d
//! ├── client-b
//! └── client-c
//! ```
//!
//! A message published on `auction-7f3…` reaches clients a, b and c only.
//! The manager is itself a [`Broadcaster`], so a single-server deployment
//! publishes straight into it; with Redis, the relay feeds it instead.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, EventMessage};
use crate::ports::{Broadcaster, Channel};

/// One websocket connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rooms keyed by channel name.
///
/// Publishing takes the read lock only, so rooms broadcast concurrently.
/// A slow client that falls more than `channel_capacity` messages behind
/// lags and is told to re-fetch state.
pub struct RoomManager {
    rooms: RwLock<HashMap<String, broadcast::Sender<EventMessage>>>,
    /// Client -> rooms it joined, for cleanup on disconnect.
    memberships: RwLock<HashMap<ClientId, Vec<String>>>,
    channel_capacity: usize,
}

impl RoomManager {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            memberships: RwLock::new(HashMap::new()),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Joins `client_id` to the channel's room, creating it if needed.
    pub async fn join(
        &self,
        channel: &Channel,
        client_id: ClientId,
    ) -> broadcast::Receiver<EventMessage> {
        let name = channel.name();
        let receiver = {
            let mut rooms = self.rooms.write().await;
            rooms
                .entry(name.clone())
                .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
                .subscribe()
        };
        self.memberships
            .write()
            .await
            .entry(client_id)
            .or_default()
            .push(name);
        receiver
    }

    /// Removes the client; rooms nobody listens to any more are dropped.
    ///
    /// Call after the client's receivers are dropped.
    pub async fn leave(&self, client_id: &ClientId) {
        let Some(names) = self.memberships.write().await.remove(client_id) else {
            return;
        };
        let mut rooms = self.rooms.write().await;
        for name in names {
            if rooms
                .get(&name)
                .map_or(false, |sender| sender.receiver_count() == 0)
            {
                rooms.remove(&name);
            }
        }
    }

    /// Delivers to a room by raw channel name. Returns how many clients
    /// received it; an empty or missing room is not an error.
    pub async fn deliver(&self, channel_name: &str, message: EventMessage) -> usize {
        let rooms = self.rooms.read().await;
        rooms
            .get(channel_name)
            .and_then(|sender| sender.send(message).ok())
            .unwrap_or(0)
    }

    pub async fn client_count(&self, channel: &Channel) -> usize {
        self.rooms
            .read()
            .await
            .get(&channel.name())
            .map_or(0, |sender| sender.receiver_count())
    }

    pub async fn active_rooms(&self) -> Vec<String> {
        self.rooms.read().await.keys().cloned().collect()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Broadcaster for RoomManager {
    async fn publish(&self, channel: &Channel, message: &EventMessage) -> Result<(), DomainError> {
        let delivered = self.deliver(&channel.name(), message.clone()).await;
        tracing::trace!(channel = %channel, event = %message.event, delivered, "Room delivery");
        Ok(())
    }
}
