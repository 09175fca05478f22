//! Auction lifecycle command handlers.

mod complete_auction;
mod pause_auction;
mod publish_auction;
mod resume_auction;
mod update_rules;

pub use complete_auction::{CompleteAuctionCommand, CompleteAuctionHandler};
pub use pause_auction::{PauseAuctionCommand, PauseAuctionHandler};
pub use publish_auction::{PublishAuctionCommand, PublishAuctionHandler};
pub use resume_auction::{ResumeAuctionCommand, ResumeAuctionHandler};
pub use update_rules::{UpdateRulesCommand, UpdateRulesHandler};

/// Result shared by lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleResult {
    pub status: crate::domain::auction::AuctionStatus,
    pub version: u64,
}
