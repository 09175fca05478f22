//! Player sale lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// AVAILABLE -> IN_BIDDING -> SOLD | UNSOLD.
///
/// SOLD goes back to IN_BIDDING only through an undo. UNSOLD players are
/// not re-queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerStatus {
    Available,
    InBidding,
    Sold,
    Unsold,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Available => "AVAILABLE",
            PlayerStatus::InBidding => "IN_BIDDING",
            PlayerStatus::Sold => "SOLD",
            PlayerStatus::Unsold => "UNSOLD",
        }
    }
}

impl StateMachine for PlayerStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use PlayerStatus::*;
        match self {
            Available => vec![InBidding],
            InBidding => vec![Sold, Unsold],
            Sold => vec![InBidding],
            Unsold => vec![],
        }
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(PlayerStatus::Available),
            "IN_BIDDING" => Ok(PlayerStatus::InBidding),
            "SOLD" => Ok(PlayerStatus::Sold),
            "UNSOLD" => Ok(PlayerStatus::Unsold),
            other => Err(ValidationError::invalid_format(
                "player_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bidding_ends_in_sold_or_unsold() {
        assert_eq!(
            PlayerStatus::InBidding.valid_transitions(),
            vec![PlayerStatus::Sold, PlayerStatus::Unsold]
        );
    }

    #[test]
    fn sold_reopens_only_to_bidding() {
        assert_eq!(PlayerStatus::Sold.valid_transitions(), vec![PlayerStatus::InBidding]);
        assert!(!PlayerStatus::Sold.can_transition_to(&PlayerStatus::Available));
    }

    #[test]
    fn unsold_is_terminal() {
        assert!(PlayerStatus::Unsold.is_terminal());
    }

    #[test]
    fn cannot_skip_bidding() {
        assert!(PlayerStatus::Available
            .transition_to(PlayerStatus::Sold)
            .is_err());
    }

    #[test]
    fn wire_names_round_trip() {
        for status in [
            PlayerStatus::Available,
            PlayerStatus::InBidding,
            PlayerStatus::Sold,
            PlayerStatus::Unsold,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
            assert_eq!(status.as_str().parse::<PlayerStatus>().unwrap(), status);
        }
    }
}
