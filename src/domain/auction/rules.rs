//! Per-auction rule set.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Amount, ValidationError};

pub const MAX_COUNTDOWN_SECONDS: u32 = 600;

/// Rules fixed before publish; edits are rejected once an auction leaves DRAFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionRules {
    /// A raise must beat the current bid by at least this much.
    pub min_bid_increment: Amount,

    /// Countdown length, reset by every accepted bid.
    pub countdown_seconds: u32,

    /// Most players one bidder may win.
    pub max_team_size: u32,

    /// Reject bids and sales that exceed a bidder's remaining purse.
    pub purse_enforcement: bool,

    /// Exact number of icon players required to publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_player_quota: Option<u32>,

    /// Registered bidders required to publish.
    pub min_bidders: u32,
}

impl AuctionRules {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_bid_increment.is_zero() {
            return Err(ValidationError::out_of_range(
                "min_bid_increment",
                1,
                i64::MAX,
                0,
            ));
        }
        if self.countdown_seconds == 0 || self.countdown_seconds > MAX_COUNTDOWN_SECONDS {
            return Err(ValidationError::out_of_range(
                "countdown_seconds",
                1,
                MAX_COUNTDOWN_SECONDS as i64,
                self.countdown_seconds as i64,
            ));
        }
        if self.max_team_size == 0 {
            return Err(ValidationError::out_of_range(
                "max_team_size",
                1,
                u32::MAX as i64,
                0,
            ));
        }
        Ok(())
    }
}

impl Default for AuctionRules {
    fn default() -> Self {
        Self {
            min_bid_increment: Amount::new(100),
            countdown_seconds: 30,
            max_team_size: 15,
            purse_enforcement: true,
            icon_player_quota: None,
            min_bidders: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(AuctionRules::default().validate().is_ok());
    }

    #[test]
    fn zero_increment_is_rejected() {
        let rules = AuctionRules {
            min_bid_increment: Amount::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            rules.validate(),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "min_bid_increment"
        ));
    }

    #[test]
    fn countdown_is_bounded() {
        for secs in [0, MAX_COUNTDOWN_SECONDS + 1] {
            let rules = AuctionRules {
                countdown_seconds: secs,
                ..Default::default()
            };
            assert!(rules.validate().is_err());
        }
    }

    #[test]
    fn team_size_must_be_positive() {
        let rules = AuctionRules {
            max_team_size: 0,
            ..Default::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn deserializes_camel_case_with_optional_quota() {
        let rules: AuctionRules = serde_json::from_str(
            r#"{"minBidIncrement":50,"countdownSeconds":20,"maxTeamSize":11,
                "purseEnforcement":false,"minBidders":4}"#,
        )
        .unwrap();
        assert_eq!(rules.min_bid_increment, Amount::new(50));
        assert_eq!(rules.icon_player_quota, None);
        assert!(!rules.purse_enforcement);
    }
}
