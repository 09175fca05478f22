//! Player sale command handlers.

mod mark_sold;
mod mark_unsold;
mod start_bidding;
mod undo_sale;

pub use mark_sold::{MarkSoldCommand, MarkSoldHandler, MarkSoldResult};
pub use mark_unsold::{MarkUnsoldCommand, MarkUnsoldHandler, MarkUnsoldResult};
pub use start_bidding::{StartBiddingCommand, StartBiddingHandler, StartBiddingResult};
pub use undo_sale::{UndoSaleCommand, UndoSaleHandler, UndoSaleResult};
