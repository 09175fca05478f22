//! Redis-backed presence for multi-server deployments.
//!
//! One sorted set per auction, `{prefix}:presence:{auction}`, scored by the
//! viewer's last heartbeat in unix seconds. Counts are always `ZCARD`, so a
//! crashed server's viewers age out on the next sweep instead of leaking.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{AuctionId, DomainError, ErrorCode, Timestamp, ViewerId};
use crate::ports::{PresenceChange, PresenceStore, SweepOutcome};

#[derive(Clone)]
pub struct RedisPresenceStore {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisPresenceStore {
    pub fn new(conn: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn roster_key(&self, auction_id: &AuctionId) -> String {
        roster_key(&self.prefix, auction_id)
    }

    fn tracked_key(&self) -> String {
        format!("{}:presence:auctions", self.prefix)
    }

    /// ZADD then ZCARD in one MULTI; ZADD reports 1 only for a new member.
    async fn touch(
        &self,
        auction_id: &AuctionId,
        viewer_id: &ViewerId,
        now: Timestamp,
    ) -> Result<PresenceChange, DomainError> {
        let key = self.roster_key(auction_id);
        let mut conn = self.conn.clone();
        let (added, count): (i64, u64) = redis::pipe()
            .atomic()
            .zadd(&key, viewer_id.as_str(), now.as_unix_secs())
            .sadd(self.tracked_key(), auction_id.to_string())
            .ignore()
            .zcard(&key)
            .query_async(&mut conn)
            .await
            .map_err(cache_error("update presence"))?;
        Ok(PresenceChange {
            count,
            changed: added > 0,
        })
    }
}

/// Expires, counts and untracks in one step, so a join landing between the
/// count and the untrack cannot leave a watched auction untracked.
///
/// KEYS: roster, tracked set. ARGV: exclusive cutoff bound, auction id.
const SWEEP_SCRIPT: &str = r#"
local expired = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
local count = redis.call('ZCARD', KEYS[1])
if count == 0 then
  redis.call('SREM', KEYS[2], ARGV[2])
end
return {expired, count}
"#;

fn roster_key(prefix: &str, auction_id: &AuctionId) -> String {
    format!("{}:presence:{}", prefix, auction_id)
}

/// Exclusive upper bound so a heartbeat exactly at the cutoff survives.
fn before(cutoff: Timestamp) -> String {
    format!("({}", cutoff.as_unix_secs())
}

fn cache_error(context: &'static str) -> impl Fn(redis::RedisError) -> DomainError {
    move |e| DomainError::new(ErrorCode::CacheError, format!("Failed to {}: {}", context, e))
}

#[async_trait]
impl PresenceStore for RedisPresenceStore {
    async fn join(
        &self,
        auction_id: &AuctionId,
        viewer_id: &ViewerId,
        now: Timestamp,
    ) -> Result<PresenceChange, DomainError> {
        self.touch(auction_id, viewer_id, now).await
    }

    async fn leave(
        &self,
        auction_id: &AuctionId,
        viewer_id: &ViewerId,
    ) -> Result<PresenceChange, DomainError> {
        let key = self.roster_key(auction_id);
        let mut conn = self.conn.clone();
        let (removed, count): (i64, u64) = redis::pipe()
            .atomic()
            .zrem(&key, viewer_id.as_str())
            .zcard(&key)
            .query_async(&mut conn)
            .await
            .map_err(cache_error("remove viewer"))?;
        Ok(PresenceChange {
            count,
            changed: removed > 0,
        })
    }

    async fn heartbeat(
        &self,
        auction_id: &AuctionId,
        viewer_id: &ViewerId,
        now: Timestamp,
    ) -> Result<PresenceChange, DomainError> {
        self.touch(auction_id, viewer_id, now).await
    }

    async fn sweep(
        &self,
        auction_id: &AuctionId,
        cutoff: Timestamp,
    ) -> Result<SweepOutcome, DomainError> {
        let mut conn = self.conn.clone();
        let (expired, count): (Vec<String>, u64) = redis::Script::new(SWEEP_SCRIPT)
            .key(self.roster_key(auction_id))
            .key(self.tracked_key())
            .arg(before(cutoff))
            .arg(auction_id.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(cache_error("sweep presence"))?;

        Ok(SweepOutcome {
            expired: expired
                .into_iter()
                .filter_map(|id| ViewerId::new(id).ok())
                .collect(),
            count,
        })
    }

    async fn count(&self, auction_id: &AuctionId) -> Result<u64, DomainError> {
        let mut conn = self.conn.clone();
        conn.zcard(self.roster_key(auction_id))
            .await
            .map_err(cache_error("count viewers"))
    }

    async fn tracked_auctions(&self) -> Result<Vec<AuctionId>, DomainError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn
            .smembers(self.tracked_key())
            .await
            .map_err(cache_error("list tracked auctions"))?;
        Ok(members
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect())
    }
}

impl std::fmt::Debug for RedisPresenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPresenceStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
