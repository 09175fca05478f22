//! Engine tuning: lock, store and broadcast deadlines plus timer and presence cadences

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Deadline for a single record-store call
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,

    /// Deadline for a single broadcast publish
    #[serde(default = "default_broadcast_timeout")]
    pub broadcast_timeout_ms: u64,

    /// How long a command waits for the per-auction lock
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,

    /// Countdown tick cadence
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Viewer sessions without a heartbeat for this long are expired
    #[serde(default = "default_heartbeat_timeout")]
    pub presence_heartbeat_timeout_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub presence_sweep_interval_secs: u64,

    /// Buffered messages per live feed room before slow viewers lag
    #[serde(default = "default_room_capacity")]
    pub room_capacity: usize,
}

impl EngineConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_millis(self.broadcast_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.presence_heartbeat_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.presence_sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let non_zero = [
            ("store_timeout_ms", self.store_timeout_ms),
            ("broadcast_timeout_ms", self.broadcast_timeout_ms),
            ("lock_timeout_ms", self.lock_timeout_ms),
            ("tick_interval_ms", self.tick_interval_ms),
            ("presence_heartbeat_timeout_secs", self.presence_heartbeat_timeout_secs),
            ("presence_sweep_interval_secs", self.presence_sweep_interval_secs),
            ("room_capacity", self.room_capacity as u64),
        ];
        if let Some((name, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(ValidationError::ZeroEngineSetting(name));
        }
        if self.presence_heartbeat_timeout_secs <= self.presence_sweep_interval_secs {
            return Err(ValidationError::HeartbeatShorterThanSweep {
                timeout_secs: self.presence_heartbeat_timeout_secs,
                sweep_secs: self.presence_sweep_interval_secs,
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout(),
            broadcast_timeout_ms: default_broadcast_timeout(),
            lock_timeout_ms: default_lock_timeout(),
            tick_interval_ms: default_tick_interval(),
            presence_heartbeat_timeout_secs: default_heartbeat_timeout(),
            presence_sweep_interval_secs: default_sweep_interval(),
            room_capacity: default_room_capacity(),
        }
    }
}

fn default_store_timeout() -> u64 {
    3_000
}

fn default_broadcast_timeout() -> u64 {
    500
}

fn default_lock_timeout() -> u64 {
    5_000
}

fn default_tick_interval() -> u64 {
    1_000
}

fn default_heartbeat_timeout() -> u64 {
    45
}

fn default_sweep_interval() -> u64 {
    15
}

fn default_room_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.heartbeat_timeout(), Duration::from_secs(45));
        assert_eq!(config.sweep_interval(), Duration::from_secs(15));
    }

    #[test]
    fn zero_setting_is_named_in_error() {
        let config = EngineConfig {
            lock_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroEngineSetting("lock_timeout_ms"))
        );
    }

    #[test]
    fn heartbeat_must_outlive_sweep_interval() {
        let config = EngineConfig {
            presence_heartbeat_timeout_secs: 10,
            presence_sweep_interval_secs: 10,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::HeartbeatShorterThanSweep {
                timeout_secs: 10,
                sweep_secs: 10
            })
        );
    }
}
