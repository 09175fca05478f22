//! Tagged failures returned by every engine operation.

use std::collections::HashMap;
use thiserror::Error;

use crate::domain::bidding::BidRejection;
use crate::domain::foundation::{
    Amount, AuctionId, BidderId, DomainError, ErrorCode, PlayerId, ValidationError,
};
use crate::domain::player::PlayerStatus;

use super::{AuctionStatus, PublishRuleViolation};

/// Error category callers switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape, rejected before touching state.
    Validation,
    NotFound,
    Forbidden,
    /// Operation not legal in the current lifecycle state.
    StateConflict,
    /// A rule threshold was not met.
    BusinessRule,
    /// Record store or deadline failure; nothing was applied.
    Infrastructure,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuctionError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Auction not found: {0}")]
    AuctionNotFound(AuctionId),

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Bidder {0} is not registered in this auction")]
    BidderNotInAuction(BidderId),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Auction is {status}, not LIVE")]
    AuctionNotLive { status: AuctionStatus },

    #[error("Auction is completed")]
    AuctionCompleted,

    #[error("Player {player_id} is {status}, not IN_BIDDING")]
    PlayerNotInBidding {
        player_id: PlayerId,
        status: PlayerStatus,
    },

    #[error("Player {0} has no bid to sell against")]
    NoActiveBid(PlayerId),

    #[error("Nothing to undo: {0}")]
    NothingToUndo(String),

    #[error("Bid of {amount} is below the minimum of {minimum}")]
    AmountBelowMinimumIncrement { amount: Amount, minimum: Amount },

    #[error("Amount {amount} exceeds remaining purse {remaining}")]
    InsufficientPurse { amount: Amount, remaining: Amount },

    #[error("Bidder already has {won} players; the team limit is {max}")]
    TeamSizeExceeded { won: u32, max: u32 },

    #[error(
        "Sale of {supplied_amount} to {supplied_bidder} does not match the current bid of {expected_amount} by {expected_bidder}"
    )]
    SaleDoesNotMatchBid {
        expected_bidder: BidderId,
        expected_amount: Amount,
        supplied_bidder: BidderId,
        supplied_amount: Amount,
    },

    #[error("Publish rejected: {}", join_violations(.0))]
    PublishValidationFailed(Vec<PublishRuleViolation>),

    #[error("Auction was modified concurrently; retry")]
    ConcurrentModification,

    #[error("{operation} timed out; retry")]
    Timeout { operation: String },

    #[error("Infrastructure failure [{code}]: {message}")]
    Infrastructure { code: ErrorCode, message: String },
}

fn join_violations(violations: &[PublishRuleViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl AuctionError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        AuctionError::Forbidden(reason.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        AuctionError::InvalidState(message.into())
    }

    pub fn nothing_to_undo(message: impl Into<String>) -> Self {
        AuctionError::NothingToUndo(message.into())
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        AuctionError::Timeout {
            operation: operation.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        use AuctionError::*;
        match self {
            Validation(_) => ErrorKind::Validation,
            AuctionNotFound(_) | PlayerNotFound(_) => ErrorKind::NotFound,
            Forbidden(_) => ErrorKind::Forbidden,
            InvalidState(_)
            | AuctionNotLive { .. }
            | AuctionCompleted
            | PlayerNotInBidding { .. }
            | NoActiveBid(_)
            | NothingToUndo(_)
            | BidderNotInAuction(_) => ErrorKind::StateConflict,
            AmountBelowMinimumIncrement { .. }
            | InsufficientPurse { .. }
            | TeamSizeExceeded { .. }
            | SaleDoesNotMatchBid { .. }
            | PublishValidationFailed(_) => ErrorKind::BusinessRule,
            ConcurrentModification | Timeout { .. } | Infrastructure { .. } => {
                ErrorKind::Infrastructure
            }
        }
    }

    pub fn code(&self) -> ErrorCode {
        use AuctionError::*;
        match self {
            Validation(_) => ErrorCode::ValidationFailed,
            AuctionNotFound(_) => ErrorCode::AuctionNotFound,
            PlayerNotFound(_) => ErrorCode::PlayerNotFound,
            BidderNotInAuction(_) => ErrorCode::BidderNotFound,
            Forbidden(_) => ErrorCode::Forbidden,
            InvalidState(_) => ErrorCode::InvalidStateTransition,
            AuctionNotLive { .. } => ErrorCode::AuctionNotLive,
            AuctionCompleted => ErrorCode::AuctionCompleted,
            PlayerNotInBidding { .. } => ErrorCode::PlayerNotInBidding,
            NoActiveBid(_) => ErrorCode::NoActiveBid,
            NothingToUndo(_) => ErrorCode::NothingToUndo,
            AmountBelowMinimumIncrement { .. } => ErrorCode::AmountBelowMinimumIncrement,
            InsufficientPurse { .. } => ErrorCode::InsufficientPurse,
            TeamSizeExceeded { .. } => ErrorCode::TeamSizeExceeded,
            SaleDoesNotMatchBid { .. } => ErrorCode::SaleAmountMismatch,
            PublishValidationFailed(_) => ErrorCode::PublishValidationFailed,
            ConcurrentModification => ErrorCode::VersionConflict,
            Timeout { .. } => ErrorCode::Timeout,
            Infrastructure { code, .. } => *code,
        }
    }

    /// Safe to retry unchanged: nothing was applied.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuctionError::ConcurrentModification | AuctionError::Timeout { .. }
        )
    }

    /// Machine-readable thresholds for business rule failures.
    pub fn details(&self) -> HashMap<String, String> {
        let mut details = HashMap::new();
        let mut put = |key: &str, value: String| {
            details.insert(key.to_string(), value);
        };
        match self {
            AuctionError::AmountBelowMinimumIncrement { amount, minimum } => {
                put("amount", amount.to_string());
                put("minimum", minimum.to_string());
            }
            AuctionError::InsufficientPurse { amount, remaining } => {
                put("amount", amount.to_string());
                put("remaining", remaining.to_string());
            }
            AuctionError::TeamSizeExceeded { won, max } => {
                put("won", won.to_string());
                put("max", max.to_string());
            }
            AuctionError::SaleDoesNotMatchBid {
                expected_bidder,
                expected_amount,
                ..
            } => {
                put("expected_bidder", expected_bidder.to_string());
                put("expected_amount", expected_amount.to_string());
            }
            AuctionError::PublishValidationFailed(violations) => {
                for violation in violations {
                    match violation {
                        PublishRuleViolation::IconPlayerCountMismatch { expected, actual } => {
                            put("icon_players_expected", expected.to_string());
                            put("icon_players_actual", actual.to_string());
                        }
                        PublishRuleViolation::NotEnoughBidders { required, actual } => {
                            put("bidders_required", required.to_string());
                            put("bidders_actual", actual.to_string());
                        }
                    }
                }
            }
            AuctionError::AuctionNotLive { status } => put("status", status.to_string()),
            AuctionError::PlayerNotInBidding { status, .. } => put("status", status.to_string()),
            AuctionError::Timeout { operation } => put("operation", operation.clone()),
            _ => {}
        }
        details
    }

    /// Flattens into the port-level error for transports.
    pub fn to_domain_error(&self) -> DomainError {
        self.details().into_iter().fold(
            DomainError::new(self.code(), self.to_string()),
            |err, (key, value)| err.with_detail(key, value),
        )
    }
}

impl From<DomainError> for AuctionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::VersionConflict => AuctionError::ConcurrentModification,
            ErrorCode::Timeout => AuctionError::Timeout {
                operation: err
                    .details
                    .get("operation")
                    .cloned()
                    .unwrap_or_else(|| err.message.clone()),
            },
            code => AuctionError::Infrastructure {
                code,
                message: err.message,
            },
        }
    }
}

impl From<BidRejection> for AuctionError {
    fn from(rejection: BidRejection) -> Self {
        match rejection {
            BidRejection::AuctionNotLive { status } => AuctionError::AuctionNotLive { status },
            BidRejection::PlayerNotInBidding { player_id, status } => {
                AuctionError::PlayerNotInBidding { player_id, status }
            }
            BidRejection::BidderNotInAuction { bidder_id } => {
                AuctionError::BidderNotInAuction(bidder_id)
            }
            BidRejection::AmountBelowMinimumIncrement { amount, minimum } => {
                AuctionError::AmountBelowMinimumIncrement { amount, minimum }
            }
            BidRejection::InsufficientPurse { amount, remaining } => {
                AuctionError::InsufficientPurse { amount, remaining }
            }
            BidRejection::TeamSizeExceeded { won, max } => {
                AuctionError::TeamSizeExceeded { won, max }
            }
        }
    }
}
