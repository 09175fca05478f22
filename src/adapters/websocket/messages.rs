//! Live feed protocol.
//!
//! - Server -> Client: connected, event, state, pong, error
//! - Client -> Server: ping (doubles as the presence heartbeat),
//!   request_state

use serde::{Deserialize, Serialize};

use crate::application::AuctionState;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{EventMessage, Timestamp};

// ============================================
// Server → Client Messages
// ============================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Joined the auction room.
    Connected(ConnectedMessage),

    /// A broadcast from one of the client's rooms.
    Event(EventMessage),

    /// Full snapshot, sent on connect, on request and after the client lagged.
    State(Box<AuctionState>),

    Pong(PongMessage),

    Error(ErrorMessage),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub auction_id: String,
    pub client_id: String,
    pub viewer_id: String,
    pub viewer_count: u64,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    pub viewer_count: u64,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&AuctionError> for ErrorMessage {
    fn from(err: &AuctionError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

// ============================================
// Client → Server Messages
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,

    /// Re-fetch authoritative state after a gap.
    RequestState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn event_is_flattened_under_its_type_tag() {
        let message = ServerMessage::Event(
            EventMessage::new("new-bid", json!({ "amount": 600 })).with_version(3),
        );

        let value: Value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["type"], "event");
        assert_eq!(value["event"], "new-bid");
        assert_eq!(value["data"]["amount"], 600);
        assert_eq!(value["version"], 3);
    }

    #[test]
    fn client_messages_parse() {
        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        let request: ClientMessage = serde_json::from_str(r#"{"type":"request_state"}"#).unwrap();

        assert_eq!(ping, ClientMessage::Ping);
        assert_eq!(request, ClientMessage::RequestState);
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"bid"}"#).is_err());
    }

    #[test]
    fn error_message_carries_code_and_retry_hint() {
        let err = AuctionError::timeout("auction lock");

        let value = serde_json::to_value(ServerMessage::Error(ErrorMessage::from(&err))).unwrap();

        assert_eq!(value["type"], "error");
        assert_eq!(value["retryable"], true);
        assert_eq!(value["code"], err.code().to_string());
    }
}
