//! Context carried by every engine command.
//!
//! Handlers take a single [`CommandMetadata`] instead of loose caller and
//! tracing parameters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Caller, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Identity and role resolved by the caller's auth layer.
    pub caller: Caller,

    /// Links related operations across one user request.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// Origin of the command, e.g. "api", "websocket", "scheduler".
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    pub fn new(caller: Caller) -> Self {
        Self {
            caller,
            correlation_id: None,
            source: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.caller.user_id
    }

    /// The supplied correlation id, or a fresh one.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}
