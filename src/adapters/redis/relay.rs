//! Redis pub/sub relay: delivers messages published by any server into
//! this server's websocket rooms.
//!
//! Pattern-subscribes to `{prefix}:*`, strips the prefix to recover the
//! channel name and hands the decoded message to the [`RoomManager`].
//! Timer signals on `{prefix}:timer-signals` go to the [`TimerCoordinator`]
//! instead. A dropped subscription is re-established after a backoff until
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::time;

use crate::adapters::websocket::RoomManager;
use crate::application::TimerCoordinator;
use crate::domain::foundation::{DomainError, ErrorCode, EventMessage};
use crate::domain::timer::TimerSignal;

use super::timer_bus::TIMER_SIGNALS;

const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

pub struct RedisRelay {
    client: redis::Client,
    prefix: String,
    rooms: Arc<RoomManager>,
    timers: Option<Arc<TimerCoordinator>>,
}

impl RedisRelay {
    pub fn new(client: redis::Client, prefix: impl Into<String>, rooms: Arc<RoomManager>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            rooms,
            timers: None,
        }
    }

    /// Also applies timer signals from other servers to `timers`.
    pub fn with_timers(mut self, timers: Arc<TimerCoordinator>) -> Self {
        self.timers = Some(timers);
        self
    }

    /// Relays until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
                result = self.relay_until_closed() => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "Redis relay subscription lost");
                    }
                    time::sleep(RECONNECT_BACKOFF).await;
                }
            }
        }
    }

    async fn relay_until_closed(&self) -> Result<(), DomainError> {
        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(relay_error("connect"))?
            .into_pubsub();
        pubsub
            .psubscribe(format!("{}:*", self.prefix))
            .await
            .map_err(relay_error("subscribe"))?;
        tracing::info!(prefix = %self.prefix, "Redis relay subscribed");

        let mut messages = pubsub.on_message();
        while let Some(msg) = messages.next().await {
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping non-text relay payload");
                    continue;
                }
            };
            match decode(&self.prefix, msg.get_channel_name(), &payload) {
                Some(Relayed::Room(channel, message)) => {
                    self.rooms.deliver(&channel, message).await;
                }
                Some(Relayed::Timer(signal)) => {
                    if let Some(timers) = &self.timers {
                        timers.receive(signal);
                    }
                }
                None => {}
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedisRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRelay")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, PartialEq)]
enum Relayed {
    Room(String, EventMessage),
    Timer(TimerSignal),
}

/// What a payload seen on `{prefix}:{channel}` is for.
fn decode(prefix: &str, key: &str, payload: &str) -> Option<Relayed> {
    let channel = key.strip_prefix(prefix)?.strip_prefix(':')?;
    let decoded = if channel == TIMER_SIGNALS {
        serde_json::from_str::<TimerSignal>(payload).map(Relayed::Timer)
    } else {
        serde_json::from_str::<EventMessage>(payload)
            .map(|message| Relayed::Room(channel.to_string(), message))
    };
    match decoded {
        Ok(relayed) => Some(relayed),
        Err(e) => {
            tracing::debug!(channel, error = %e, "Skipping malformed relay payload");
            None
        }
    }
}

fn relay_error(step: &'static str) -> impl Fn(redis::RedisError) -> DomainError {
    move |e| DomainError::new(ErrorCode::CacheError, format!("Redis relay {} failed: {}", step, e))
}
