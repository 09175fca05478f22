//! Purse maintenance handlers.

mod recompute_purses;

pub use recompute_purses::{RecomputePursesCommand, RecomputePursesHandler, RecomputePursesResult};
