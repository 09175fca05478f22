//! Bidding module - the pure bid validator.

mod validator;

pub use validator::{minimum_acceptable, validate_bid, BidContext, BidDecision, BidRejection};
