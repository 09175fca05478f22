//! Auction module - lifecycle state machine, rules and publish checks.

mod aggregate;
mod errors;
mod publish;
mod rules;
mod status;

pub use aggregate::{Auction, SaleRecord, MAX_NAME_LENGTH};
pub use errors::{AuctionError, ErrorKind};
pub use publish::{publish_violations, PublishRuleViolation};
pub use rules::{AuctionRules, MAX_COUNTDOWN_SECONDS};
pub use status::AuctionStatus;
