//! RecomputePursesHandler - out-of-band purse reconciliation.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, CommandMetadata};
use crate::domain::purse::PurseAdjustment;

#[derive(Debug, Clone)]
pub struct RecomputePursesCommand {
    pub auction_id: AuctionId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecomputePursesResult {
    /// Only bidders whose spend was wrong.
    pub adjustments: Vec<PurseAdjustment>,
    pub version: u64,
}

/// Rebuilds every bidder's spend from SOLD players. Idempotent, allowed in
/// any auction status, commits nothing when the purses already agree.
pub struct RecomputePursesHandler {
    executor: Arc<FloorExecutor>,
}

impl RecomputePursesHandler {
    pub fn new(executor: Arc<FloorExecutor>) -> Self {
        Self { executor }
    }

    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id))]
    pub async fn handle(
        &self,
        cmd: RecomputePursesCommand,
        metadata: CommandMetadata,
    ) -> Result<RecomputePursesResult, AuctionError> {
        let caller = metadata.caller.clone();
        let committed = self
            .executor
            .execute(cmd.auction_id, move |floor| {
                floor.authorize_admin(&caller)?;
                Ok(floor.reconcile_purses())
            })
            .await?;

        if !committed.value.is_empty() {
            tracing::warn!(
                auction_id = %cmd.auction_id,
                adjusted = committed.value.len(),
                "Purse drift repaired"
            );
        }

        Ok(RecomputePursesResult {
            adjustments: committed.value,
            version: committed.version,
        })
    }
}
