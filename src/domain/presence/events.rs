//! Presence broadcasts.

use serde::Serialize;

/// Absolute viewer count, so a missed update heals on the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerCountUpdate {
    pub count: u64,
}

crate::broadcast_event!(ViewerCountUpdate, "viewer-count-update");
