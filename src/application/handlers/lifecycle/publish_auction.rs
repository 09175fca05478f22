//! PublishAuctionHandler - DRAFT -> LIVE.

use std::sync::Arc;

use crate::application::executor::FloorExecutor;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, CommandMetadata, Timestamp};

use super::LifecycleResult;

#[derive(Debug, Clone)]
pub struct PublishAuctionCommand {
    pub auction_id: AuctionId,
}

/// Goes LIVE once the icon quota and bidder minimum hold; otherwise fails
/// naming every unmet rule.
pub struct PublishAuctionHandler {
    executor: Arc<FloorExecutor>,
}

impl PublishAuctionHandler {
    pub fn new(executor: Arc<FloorExecutor>) -> Self {
        Self { executor }
    }

    #[tracing::instrument(skip_all, fields(auction_id = %cmd.auction_id))]
    pub async fn handle(
        &self,
        cmd: PublishAuctionCommand,
        metadata: CommandMetadata,
    ) -> Result<LifecycleResult, AuctionError> {
        let caller = metadata.caller.clone();
        let committed = self
            .executor
            .execute(cmd.auction_id, move |floor| {
                floor.authorize_admin(&caller)?;
                floor.publish(Timestamp::now())?;
                Ok(floor.auction().status())
            })
            .await?;

        Ok(LifecycleResult {
            status: committed.value,
            version: committed.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{admin, draft_floor_with, harness};
    use crate::domain::auction::{AuctionRules, AuctionStatus, ErrorKind};

    #[tokio::test]
    async fn icon_quota_mismatch_reports_both_counts() {
        let h = harness();
        let rules = AuctionRules {
            icon_player_quota: Some(3),
            ..Default::default()
        };
        let floor = draft_floor_with(rules, 6, 2, 2);
        let auction_id = *floor.auction().id();
        h.executor.insert(&floor).await.unwrap();

        let err = PublishAuctionHandler::new(h.executor.clone())
            .handle(PublishAuctionCommand { auction_id }, admin())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BusinessRule);
        let details = err.details();
        assert_eq!(details["icon_players_expected"], "3");
        assert_eq!(details["icon_players_actual"], "2");
        assert_eq!(h.floor(auction_id).await.auction().status(), AuctionStatus::Draft);
    }

    #[tokio::test]
    async fn publish_goes_live_and_announces_it() {
        let h = harness();
        let s = h.draft(3, 2).await;

        let result = PublishAuctionHandler::new(h.executor.clone())
            .handle(
                PublishAuctionCommand {
                    auction_id: s.auction_id,
                },
                admin(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, AuctionStatus::Live);
        assert!(h.broadcaster.last_named("auction-started").is_some());
    }

    #[tokio::test]
    async fn too_few_bidders_is_rejected() {
        let h = harness();
        let s = h.draft(3, 1).await;

        let err = PublishAuctionHandler::new(h.executor.clone())
            .handle(
                PublishAuctionCommand {
                    auction_id: s.auction_id,
                },
                admin(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.details()["bidders_required"], "2");
        assert_eq!(err.details()["bidders_actual"], "1");
    }
}
