//! Application handlers.
//!
//! One command or query handler per engine operation. Command handlers run
//! their domain operation through the [`FloorExecutor`], then drive the
//! timer coordinator from the committed result.
//!
//! [`FloorExecutor`]: super::executor::FloorExecutor

pub mod bidding;
pub mod lifecycle;
pub mod purse;
pub mod query;
pub mod sale;
pub mod viewer;

pub use bidding::{
    PlaceBidCommand, PlaceBidHandler, PlaceBidResult, UndoBidCommand, UndoBidHandler,
    UndoBidResult,
};
pub use lifecycle::{
    CompleteAuctionCommand, CompleteAuctionHandler, LifecycleResult, PauseAuctionCommand,
    PauseAuctionHandler, PublishAuctionCommand, PublishAuctionHandler, ResumeAuctionCommand,
    ResumeAuctionHandler, UpdateRulesCommand, UpdateRulesHandler,
};
pub use purse::{RecomputePursesCommand, RecomputePursesHandler, RecomputePursesResult};
pub use query::{
    AuctionState, GetAuctionStateHandler, GetAuctionStateQuery, GetViewerCountHandler,
    GetViewerCountQuery,
};
pub use sale::{
    MarkSoldCommand, MarkSoldHandler, MarkSoldResult, MarkUnsoldCommand, MarkUnsoldHandler,
    MarkUnsoldResult, StartBiddingCommand, StartBiddingHandler, StartBiddingResult,
    UndoSaleCommand, UndoSaleHandler, UndoSaleResult,
};
pub use viewer::{
    HeartbeatViewerCommand, HeartbeatViewerHandler, JoinViewerCommand, JoinViewerHandler,
    LeaveViewerCommand, LeaveViewerHandler,
};
