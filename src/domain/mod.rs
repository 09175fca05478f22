//! Domain layer containing the auction rules and types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, money, timestamps, errors, events)
//! - `auction` - Auction aggregate, lifecycle and rules
//! - `player` - Player sale state machine and bids
//! - `bidder` - Bidder budgets
//! - `purse` - Purse debit, credit and reconciliation
//! - `bidding` - Pure bid validation
//! - `timer` - Countdown state
//! - `presence` - Viewer roster
//! - `floor` - One auction as a consistency unit, with its operations

pub mod auction;
pub mod bidder;
pub mod bidding;
pub mod floor;
pub mod foundation;
pub mod player;
pub mod presence;
pub mod purse;
pub mod timer;
