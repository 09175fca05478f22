//! Recording broadcaster for tests.
//!
//! Captures every published message for assertions and can be told to fail
//! or stall, which is how the gateway's swallow and timeout paths are tested.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode, EventMessage};
use crate::ports::{Broadcaster, Channel};

#[derive(Default)]
pub struct RecordingBroadcaster {
    published: RwLock<Vec<(Channel, EventMessage)>>,
    failing: AtomicBool,
    stall: RwLock<Option<Duration>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    pub fn published(&self) -> Vec<(Channel, EventMessage)> {
        self.published
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Messages sent to one channel, oldest first.
    pub fn messages_on(&self, channel: &Channel) -> Vec<EventMessage> {
        self.published()
            .into_iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, message)| message)
            .collect()
    }

    /// Event names sent to one channel, oldest first.
    pub fn event_names(&self, channel: &Channel) -> Vec<String> {
        self.messages_on(channel)
            .into_iter()
            .map(|message| message.event)
            .collect()
    }

    pub fn last_named(&self, event: &str) -> Option<EventMessage> {
        self.published()
            .into_iter()
            .rev()
            .map(|(_, message)| message)
            .find(|message| message.event == event)
    }

    pub fn clear(&self) {
        self.published
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_stall(&self, stall: Option<Duration>) {
        *self
            .stall
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = stall;
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn publish(&self, channel: &Channel, message: &EventMessage) -> Result<(), DomainError> {
        let stall = *self
            .stall
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::BroadcastError,
                format!("Failed to publish to {}", channel),
            ));
        }
        self.published
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((channel.clone(), message.clone()));
        Ok(())
    }
}
