//! Pausable per-player countdown, advanced one second per tick.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Running,
    /// Auction paused; remaining seconds are held.
    Frozen,
    /// Reached zero; waits for the admin to decide.
    Expired,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Remaining(u32),
    /// This tick reached zero.
    Expired,
    /// Frozen or already expired; nothing changed.
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    player_id: PlayerId,
    duration_secs: u32,
    remaining_secs: u32,
    state: CountdownState,
}

impl Countdown {
    pub fn start(player_id: PlayerId, duration_secs: u32) -> Self {
        Self {
            player_id,
            duration_secs,
            remaining_secs: duration_secs,
            state: if duration_secs == 0 {
                CountdownState::Expired
            } else {
                CountdownState::Running
            },
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn tick(&mut self) -> Tick {
        if self.state != CountdownState::Running {
            return Tick::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = CountdownState::Expired;
            Tick::Expired
        } else {
            Tick::Remaining(self.remaining_secs)
        }
    }

    /// Back to full duration. A frozen countdown stays frozen; an expired
    /// one runs again.
    pub fn reset(&mut self) {
        self.remaining_secs = self.duration_secs;
        if self.state == CountdownState::Expired && self.duration_secs > 0 {
            self.state = CountdownState::Running;
        }
    }

    /// Holds the remaining seconds. Returns false if it was not running.
    pub fn freeze(&mut self) -> bool {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Frozen;
            true
        } else {
            false
        }
    }

    /// Continues from the held value. Returns false if it was not frozen.
    pub fn resume(&mut self) -> bool {
        if self.state != CountdownState::Frozen {
            return false;
        }
        self.state = if self.remaining_secs == 0 {
            CountdownState::Expired
        } else {
            CountdownState::Running
        };
        true
    }
}
