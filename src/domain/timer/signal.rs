//! Countdown commands as they travel between engine instances.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuctionId, NodeId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerCommand {
    /// Fresh countdown for the player now in bidding. `frozen` holds it, for
    /// a paused auction.
    Start {
        player_id: PlayerId,
        seconds: u32,
        frozen: bool,
    },
    /// Ignored unless the countdown belongs to `player_id`.
    Reset { player_id: PlayerId },
    Freeze,
    Resume,
    /// `None` stops whatever is running.
    Stop { player_id: Option<PlayerId> },
    /// Auction is over; the countdown and its task go away.
    Close,
}

/// A command stamped with the floor version whose commit issued it.
///
/// Versions order commands across instances: a countdown applies a signal
/// only if its version is newer than the last one it applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSignal {
    pub auction_id: AuctionId,
    pub version: u64,
    /// Instance that issued the command. The origin of a `Start` owns the
    /// countdown and is the only one that broadcasts it.
    pub origin: NodeId,
    pub command: TimerCommand,
}

impl TimerSignal {
    pub fn new(auction_id: AuctionId, version: u64, origin: NodeId, command: TimerCommand) -> Self {
        Self {
            auction_id,
            version,
            origin,
            command,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
