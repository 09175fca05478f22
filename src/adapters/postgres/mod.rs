//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresAuctionStore` - Versioned, transactional auction floor storage

mod auction_store;

pub use auction_store::PostgresAuctionStore;
