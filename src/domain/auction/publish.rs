//! Preconditions checked when a DRAFT auction goes LIVE.

use serde::Serialize;
use std::fmt;

use super::AuctionRules;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum PublishRuleViolation {
    /// Flagged icon players differ from the configured quota.
    IconPlayerCountMismatch { expected: u32, actual: u32 },
    NotEnoughBidders { required: u32, actual: u32 },
}

impl fmt::Display for PublishRuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishRuleViolation::IconPlayerCountMismatch { expected, actual } => write!(
                f,
                "icon player count mismatch: {} of {} required",
                actual, expected
            ),
            PublishRuleViolation::NotEnoughBidders { required, actual } => write!(
                f,
                "not enough bidders: {} registered, {} required",
                actual, required
            ),
        }
    }
}

/// Every unmet publish rule, in a stable order.
pub fn publish_violations(
    rules: &AuctionRules,
    icon_players: u32,
    bidders: u32,
) -> Vec<PublishRuleViolation> {
    let mut violations = Vec::new();
    if let Some(expected) = rules.icon_player_quota {
        if icon_players != expected {
            violations.push(PublishRuleViolation::IconPlayerCountMismatch {
                expected,
                actual: icon_players,
            });
        }
    }
    if bidders < rules.min_bidders {
        violations.push(PublishRuleViolation::NotEnoughBidders {
            required: rules.min_bidders,
            actual: bidders,
        });
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(quota: Option<u32>, min_bidders: u32) -> AuctionRules {
        AuctionRules {
            icon_player_quota: quota,
            min_bidders,
            ..Default::default()
        }
    }

    #[test]
    fn two_icons_against_quota_of_three() {
        let violations = publish_violations(&rules(Some(3), 2), 2, 2);
        assert_eq!(
            violations,
            vec![PublishRuleViolation::IconPlayerCountMismatch {
                expected: 3,
                actual: 2
            }]
        );
    }

    #[test]
    fn surplus_icons_also_mismatch() {
        assert_eq!(publish_violations(&rules(Some(3), 0), 4, 0).len(), 1);
    }

    #[test]
    fn no_quota_means_icons_are_unchecked() {
        assert!(publish_violations(&rules(None, 2), 7, 2).is_empty());
    }

    #[test]
    fn short_bidder_count_is_reported_with_both_numbers() {
        let violations = publish_violations(&rules(None, 4), 0, 3);
        assert_eq!(
            violations[0].to_string(),
            "not enough bidders: 3 registered, 4 required"
        );
    }
}
