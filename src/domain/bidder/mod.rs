//! Bidder module - registered teams and their purses.

mod entity;

pub use entity::Bidder;
