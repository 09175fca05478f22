//! UpdateRulesHandler - rule edits before publish.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::domain::auction::{AuctionError, AuctionRules};
use crate::domain::foundation::{AuctionId, CommandMetadata, Timestamp};

#[derive(Debug, Clone)]
pub struct UpdateRulesCommand {
    pub auction_id: AuctionId,
    pub rules: AuctionRules,
}

pub struct UpdateRulesHandler {
    executor: Arc<FloorExecutor>,
}

impl UpdateRulesHandler {
    pub fn new(executor: Arc<FloorExecutor>) -> Self {
        Self { executor }
    }

    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id))]
    pub async fn handle(
        &self,
        cmd: UpdateRulesCommand,
        metadata: CommandMetadata,
    ) -> Result<u64, AuctionError> {
        // 1. Shape check before taking the lock
        cmd.rules.validate()?;

        // 2. DRAFT only
        let caller = metadata.caller.clone();
        let rules = cmd.rules;
        let committed = self
            .executor
            .execute(cmd.auction_id, move |floor| {
                floor.authorize_admin(&caller)?;
                floor.update_rules(rules, Timestamp::now())
            })
            .await?;

        Ok(committed.version)
    }
}
