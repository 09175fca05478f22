//! Redis pub/sub timer bus.
//!
//! Signals are PUBLISHed as JSON on `{prefix}:timer-signals`. The
//! [`RedisRelay`](super::RedisRelay) of every server picks them up from its
//! pattern subscription and hands them to the local timer coordinator.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::timer::TimerSignal;
use crate::ports::TimerBus;

/// Channel name under the prefix. Broadcast channels are `auction-*` and
/// `private-user-*`, so it cannot collide with one.
pub const TIMER_SIGNALS: &str = "timer-signals";

#[derive(Clone)]
pub struct RedisTimerBus {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisTimerBus {
    pub fn new(conn: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    pub fn channel_key(&self) -> String {
        signals_key(&self.prefix)
    }
}

pub(super) fn signals_key(prefix: &str) -> String {
    format!("{}:{}", prefix, TIMER_SIGNALS)
}

#[async_trait]
impl TimerBus for RedisTimerBus {
    async fn publish(&self, signal: &TimerSignal) -> Result<(), DomainError> {
        let payload = signal.to_json().map_err(|e| {
            DomainError::new(
                ErrorCode::CacheError,
                format!("Failed to encode timer signal: {}", e),
            )
        })?;

        let mut conn = self.conn.clone();
        let _receivers: i64 = conn
            .publish(self.channel_key(), payload)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::new(
                    ErrorCode::CacheError,
                    format!("Failed to publish timer signal: {}", e),
                )
            })?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisTimerBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTimerBus")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
