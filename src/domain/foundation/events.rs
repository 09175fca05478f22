//! Broadcast event contract.
//!
//! Every payload that leaves the engine implements [`BroadcastEvent`], which
//! names the event on the wire. [`EventMessage`] is the transport form handed
//! to a broadcaster: event name, JSON payload, the floor version that produced
//! it (if any) and the send time.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::Timestamp;

/// A payload published on an auction or user channel.
pub trait BroadcastEvent: Serialize + Send + Sync {
    /// Wire name, e.g. `new-bid`.
    fn event_name(&self) -> &'static str;

    fn to_message(&self) -> Result<EventMessage, serde_json::Error> {
        Ok(EventMessage::new(self.event_name(), serde_json::to_value(self)?))
    }
}

/// Implements [`BroadcastEvent`] for a payload struct.
///
/// ```ignore
/// broadcast_event!(TimerUpdate, "timer-update");
/// ```
#[macro_export]
macro_rules! broadcast_event {
    ($payload:ident, $name:expr) => {
        impl $crate::domain::foundation::BroadcastEvent for $payload {
            fn event_name(&self) -> &'static str {
                $name
            }
        }
    };
}

/// Transport envelope for one broadcast.
///
/// `version` is the committed floor version for auction state events, so a
/// client can drop anything older than what it already applied. Timer and
/// presence messages carry absolute values and leave it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    pub event: String,
    pub data: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    pub sent_at: Timestamp,
}

impl EventMessage {
    pub fn new(event: impl Into<String>, data: JsonValue) -> Self {
        Self {
            event: event.into(),
            data,
            version: None,
            sent_at: Timestamp::now(),
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
