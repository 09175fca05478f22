//! Error types shared by the domain layer and its ports.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors raised while constructing value objects or checking input shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Stable, machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation
    ValidationFailed,

    // Not found
    AuctionNotFound,
    PlayerNotFound,
    BidderNotFound,

    // Authorization
    Forbidden,

    // State conflicts
    InvalidStateTransition,
    AuctionNotLive,
    AuctionCompleted,
    PlayerNotInBidding,
    NoActiveBid,
    NothingToUndo,

    // Business rules
    AmountBelowMinimumIncrement,
    InsufficientPurse,
    TeamSizeExceeded,
    SaleAmountMismatch,
    PublishValidationFailed,

    // Infrastructure
    VersionConflict,
    Timeout,
    DatabaseError,
    CacheError,
    BroadcastError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::AuctionNotFound => "AUCTION_NOT_FOUND",
            ErrorCode::PlayerNotFound => "PLAYER_NOT_FOUND",
            ErrorCode::BidderNotFound => "BIDDER_NOT_FOUND",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InvalidStateTransition => "INVALID_STATE",
            ErrorCode::AuctionNotLive => "AUCTION_NOT_LIVE",
            ErrorCode::AuctionCompleted => "AUCTION_COMPLETED",
            ErrorCode::PlayerNotInBidding => "PLAYER_NOT_IN_BIDDING",
            ErrorCode::NoActiveBid => "NO_ACTIVE_BID",
            ErrorCode::NothingToUndo => "NOTHING_TO_UNDO",
            ErrorCode::AmountBelowMinimumIncrement => "AMOUNT_BELOW_MINIMUM_INCREMENT",
            ErrorCode::InsufficientPurse => "INSUFFICIENT_PURSE",
            ErrorCode::TeamSizeExceeded => "TEAM_SIZE_EXCEEDED",
            ErrorCode::SaleAmountMismatch => "SALE_AMOUNT_MISMATCH",
            ErrorCode::PublishValidationFailed => "PUBLISH_VALIDATION_FAILED",
            ErrorCode::VersionConflict => "VERSION_CONFLICT",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::BroadcastError => "BROADCAST_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Error returned across port boundaries: a code, a message and details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Optimistic-concurrency failure on a versioned write.
    pub fn version_conflict(expected: u64) -> Self {
        Self::new(
            ErrorCode::VersionConflict,
            "Record was modified by another writer",
        )
        .with_detail("expected_version", expected.to_string())
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        Self::new(ErrorCode::Timeout, format!("{} timed out", operation))
            .with_detail("operation", operation)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}
