//! Timer broadcasts.

use serde::Serialize;

use crate::domain::foundation::PlayerId;

/// Absolute remaining seconds for the active player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerUpdate {
    pub seconds: u32,
}

crate::broadcast_event!(TimerUpdate, "timer-update");

/// Countdown hit zero; the admin decides the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerExpired {
    pub player_id: PlayerId,
}

crate::broadcast_event!(TimerExpired, "timer-expired");
