//! Auction lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// DRAFT -> LIVE <-> PAUSED -> COMPLETED.
///
/// Only the LIVE/PAUSED toggle moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Draft,
    Live,
    Paused,
    Completed,
}

impl AuctionStatus {
    /// New bids are accepted only while LIVE.
    pub fn accepts_bids(&self) -> bool {
        matches!(self, AuctionStatus::Live)
    }

    /// Admin sale, unsold and undo actions are allowed while LIVE or PAUSED.
    pub fn allows_sale_actions(&self) -> bool {
        matches!(self, AuctionStatus::Live | AuctionStatus::Paused)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Draft => "DRAFT",
            AuctionStatus::Live => "LIVE",
            AuctionStatus::Paused => "PAUSED",
            AuctionStatus::Completed => "COMPLETED",
        }
    }
}

impl StateMachine for AuctionStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use AuctionStatus::*;
        match self {
            Draft => vec![Live],
            Live => vec![Paused, Completed],
            Paused => vec![Live, Completed],
            Completed => vec![],
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(AuctionStatus::Draft),
            "LIVE" => Ok(AuctionStatus::Live),
            "PAUSED" => Ok(AuctionStatus::Paused),
            "COMPLETED" => Ok(AuctionStatus::Completed),
            other => Err(ValidationError::invalid_format(
                "auction_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AuctionStatus; 4] = [
        AuctionStatus::Draft,
        AuctionStatus::Live,
        AuctionStatus::Paused,
        AuctionStatus::Completed,
    ];

    #[test]
    fn draft_can_only_go_live() {
        assert_eq!(AuctionStatus::Draft.valid_transitions(), vec![AuctionStatus::Live]);
    }

    #[test]
    fn live_and_paused_toggle() {
        assert!(AuctionStatus::Live.can_transition_to(&AuctionStatus::Paused));
        assert!(AuctionStatus::Paused.can_transition_to(&AuctionStatus::Live));
    }

    #[test]
    fn nothing_returns_to_draft() {
        for status in ALL {
            assert!(!status.can_transition_to(&AuctionStatus::Draft));
        }
    }

    #[test]
    fn completed_is_terminal() {
        assert!(AuctionStatus::Completed.is_terminal());
        assert!(AuctionStatus::Completed
            .transition_to(AuctionStatus::Live)
            .is_err());
    }

    #[test]
    fn only_live_accepts_bids() {
        let accepting: Vec<_> = ALL.into_iter().filter(|s| s.accepts_bids()).collect();
        assert_eq!(accepting, vec![AuctionStatus::Live]);
        assert!(AuctionStatus::Paused.allows_sale_actions());
        assert!(!AuctionStatus::Draft.allows_sale_actions());
    }

    #[test]
    fn parses_its_own_display() {
        for status in ALL {
            assert_eq!(status.to_string().parse::<AuctionStatus>().unwrap(), status);
        }
        assert!("ARCHIVED".parse::<AuctionStatus>().is_err());
    }

    #[test]
    fn serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&AuctionStatus::Paused).unwrap(),
            "\"PAUSED\""
        );
    }
}
