//! Redis pub/sub broadcaster for multi-server deployments.
//!
//! Each message is PUBLISHed as JSON on `{prefix}:{channel}`; every server
//! subscribes and relays to its own websocket rooms.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{DomainError, ErrorCode, EventMessage};
use crate::ports::{Broadcaster, Channel};

#[derive(Clone)]
pub struct RedisBroadcaster {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisBroadcaster {
    pub fn new(conn: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    /// Full pub/sub channel name for `channel`.
    pub fn channel_key(&self, channel: &Channel) -> String {
        channel_key(&self.prefix, channel)
    }
}

fn channel_key(prefix: &str, channel: &Channel) -> String {
    format!("{}:{}", prefix, channel.name())
}

#[async_trait]
impl Broadcaster for RedisBroadcaster {
    async fn publish(&self, channel: &Channel, message: &EventMessage) -> Result<(), DomainError> {
        let payload = message.to_json().map_err(|e| {
            DomainError::new(
                ErrorCode::BroadcastError,
                format!("Failed to encode {}: {}", message.event, e),
            )
        })?;

        let mut conn = self.conn.clone();
        let _receivers: i64 = conn
            .publish(self.channel_key(channel), payload)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::new(
                    ErrorCode::BroadcastError,
                    format!("Failed to publish to {}: {}", channel, e),
                )
            })?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroadcaster")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
