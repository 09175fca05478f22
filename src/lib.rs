//! Live Auction - a live, time-boxed player auction bidding engine.
//!
//! An administrator drives players through bidding by registered teams.
//! Bids are validated against purse and increment rules, sales debit purses
//! atomically, countdowns and viewer counts stream to every watcher.
//!
//! Layers follow ports and adapters: `domain` holds the rules, `ports` the
//! traits the engine needs, `adapters` their implementations and
//! `application` the engine that ties them together.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
