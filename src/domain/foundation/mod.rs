//! Foundation module - shared domain primitives.
//!
//! Identifiers, amounts, timestamps, the lifecycle trait, error types and the
//! broadcast event contract used by every auction module.

mod auth;
mod command;
mod errors;
mod events;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use auth::{Caller, Role};
pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{BroadcastEvent, EventMessage};
pub use ids::{AuctionId, BidderId, NodeId, PlayerId, UserId, ViewerId};
pub use money::Amount;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
