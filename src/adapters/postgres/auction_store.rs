//! PostgreSQL implementation of AuctionStore.
//!
//! A floor lives in three tables. `commit` bumps `auctions.version` with a
//! conditional update and writes dirty players and bidders in the same
//! transaction; dropping the transaction on any error rolls all of it back.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::auction::{Auction, AuctionRules, AuctionStatus, SaleRecord};
use crate::domain::bidder::Bidder;
use crate::domain::floor::AuctionFloor;
use crate::domain::foundation::{
    Amount, AuctionId, BidderId, DomainError, ErrorCode, PlayerId, Timestamp, UserId,
};
use crate::domain::player::{Bid, Player, PlayerStatus};
use crate::ports::AuctionStore;

#[derive(Clone)]
pub struct PostgresAuctionStore {
    pool: PgPool,
}

impl PostgresAuctionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_player(
        tx: &mut Transaction<'_, Postgres>,
        player: &Player,
        position: usize,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO players (
                id, auction_id, position, name, base_price, icon, attributes,
                status, sold_to, sold_price, bid_history
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(player.id().as_uuid())
        .bind(player.auction_id().as_uuid())
        .bind(position as i32)
        .bind(player.name())
        .bind(amount_to_db(player.base_price())?)
        .bind(player.is_icon())
        .bind(JsonValue::Object(player.attributes().clone()))
        .bind(player.status().as_str())
        .bind(player.sold_to().map(|id| *id.as_uuid()))
        .bind(player.sold_price().map(amount_to_db).transpose()?)
        .bind(to_json(player.bid_history())?)
        .execute(&mut **tx)
        .await
        .map_err(db_error("insert player"))?;
        Ok(())
    }

    async fn insert_bidder(
        tx: &mut Transaction<'_, Postgres>,
        bidder: &Bidder,
        position: usize,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO bidders (
                id, auction_id, position, user_id, name, team_name, total_purse, spent
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(bidder.id().as_uuid())
        .bind(bidder.auction_id().as_uuid())
        .bind(position as i32)
        .bind(bidder.user_id().map(UserId::as_str))
        .bind(bidder.name())
        .bind(bidder.team_name())
        .bind(amount_to_db(bidder.total_purse())?)
        .bind(amount_to_db(bidder.spent())?)
        .execute(&mut **tx)
        .await
        .map_err(db_error("insert bidder"))?;
        Ok(())
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn load(&self, auction_id: &AuctionId) -> Result<Option<AuctionFloor>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, status, rules, registration_open, published,
                   active_player_id, last_sale, version, created_at, updated_at
            FROM auctions
            WHERE id = $1
            "#,
        )
        .bind(auction_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch auction"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let version: i64 = row.try_get("version").map_err(db_error("read auction"))?;
        let auction = row_to_auction(&row)?;

        let players = sqlx::query(
            r#"
            SELECT id, auction_id, name, base_price, icon, attributes,
                   status, sold_to, sold_price, bid_history
            FROM players
            WHERE auction_id = $1
            ORDER BY position
            "#,
        )
        .bind(auction_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch players"))?
        .iter()
        .map(row_to_player)
        .collect::<Result<Vec<_>, _>>()?;

        let bidders = sqlx::query(
            r#"
            SELECT id, auction_id, user_id, name, team_name, total_purse, spent
            FROM bidders
            WHERE auction_id = $1
            ORDER BY position
            "#,
        )
        .bind(auction_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch bidders"))?
        .iter()
        .map(row_to_bidder)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(AuctionFloor::restore(
            auction,
            players,
            bidders,
            version_from_db(version)?,
        )))
    }

    async fn insert(&self, floor: &AuctionFloor) -> Result<(), DomainError> {
        let auction = floor.auction();
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO auctions (
                id, owner_id, name, status, rules, registration_open, published,
                active_player_id, last_sale, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(auction.id().as_uuid())
        .bind(auction.owner_id().as_str())
        .bind(auction.name())
        .bind(auction.status().as_str())
        .bind(to_json(auction.rules())?)
        .bind(auction.registration_open())
        .bind(auction.is_published())
        .bind(auction.active_player().map(|id| *id.as_uuid()))
        .bind(auction.last_sale().map(to_json).transpose()?)
        .bind(auction.created_at().as_datetime())
        .bind(auction.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert auction"))?;

        if inserted.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::VersionConflict,
                format!("Auction already exists: {}", auction.id()),
            ));
        }

        for (position, player) in floor.players().iter().enumerate() {
            Self::insert_player(&mut tx, player, position).await?;
        }
        for (position, bidder) in floor.bidders().iter().enumerate() {
            Self::insert_bidder(&mut tx, bidder, position).await?;
        }

        tx.commit().await.map_err(db_error("commit insert"))?;
        Ok(())
    }

    async fn commit(&self, floor: &AuctionFloor) -> Result<u64, DomainError> {
        let auction = floor.auction();
        let expected = version_to_db(floor.version())?;
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let updated = sqlx::query(
            r#"
            UPDATE auctions SET
                status = $3,
                rules = $4,
                registration_open = $5,
                published = $6,
                active_player_id = $7,
                last_sale = $8,
                updated_at = $9,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(auction.id().as_uuid())
        .bind(expected)
        .bind(auction.status().as_str())
        .bind(to_json(auction.rules())?)
        .bind(auction.registration_open())
        .bind(auction.is_published())
        .bind(auction.active_player().map(|id| *id.as_uuid()))
        .bind(auction.last_sale().map(to_json).transpose()?)
        .bind(auction.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("update auction"))?;

        if updated.rows_affected() == 0 {
            let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM auctions WHERE id = $1")
                .bind(auction.id().as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error("check auction"))?;
            return Err(if exists.0 == 0 {
                DomainError::new(
                    ErrorCode::AuctionNotFound,
                    format!("Auction not found: {}", auction.id()),
                )
            } else {
                DomainError::version_conflict(floor.version())
            });
        }

        let changes = floor.changes();
        for player in floor
            .players()
            .iter()
            .filter(|p| changes.players.contains(&p.id()))
        {
            sqlx::query(
                r#"
                UPDATE players SET
                    status = $2,
                    sold_to = $3,
                    sold_price = $4,
                    bid_history = $5
                WHERE id = $1
                "#,
            )
            .bind(player.id().as_uuid())
            .bind(player.status().as_str())
            .bind(player.sold_to().map(|id| *id.as_uuid()))
            .bind(player.sold_price().map(amount_to_db).transpose()?)
            .bind(to_json(player.bid_history())?)
            .execute(&mut *tx)
            .await
            .map_err(db_error("update player"))?;
        }

        for bidder in floor
            .bidders()
            .iter()
            .filter(|b| changes.bidders.contains(&b.id()))
        {
            sqlx::query("UPDATE bidders SET spent = $2 WHERE id = $1")
                .bind(bidder.id().as_uuid())
                .bind(amount_to_db(bidder.spent())?)
                .execute(&mut *tx)
                .await
                .map_err(db_error("update bidder"))?;
        }

        tx.commit().await.map_err(db_error("commit floor"))?;
        Ok(floor.version() + 1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row mapping
// ─────────────────────────────────────────────────────────────────────────────

fn row_to_auction(row: &PgRow) -> Result<Auction, DomainError> {
    let read = db_error("read auction");
    let status: String = row.try_get("status").map_err(&read)?;
    let rules: JsonValue = row.try_get("rules").map_err(&read)?;
    let last_sale: Option<JsonValue> = row.try_get("last_sale").map_err(&read)?;
    let active: Option<uuid::Uuid> = row.try_get("active_player_id").map_err(&read)?;
    let owner: String = row.try_get("owner_id").map_err(&read)?;

    Ok(Auction::reconstitute(
        AuctionId::from_uuid(row.try_get("id").map_err(&read)?),
        UserId::new(owner).map_err(invalid_row)?,
        row.try_get("name").map_err(&read)?,
        status.parse::<AuctionStatus>().map_err(invalid_row)?,
        from_json::<AuctionRules>(rules)?,
        row.try_get("registration_open").map_err(&read)?,
        row.try_get("published").map_err(&read)?,
        active.map(PlayerId::from_uuid),
        last_sale.map(from_json::<SaleRecord>).transpose()?,
        Timestamp::from_datetime(row.try_get("created_at").map_err(&read)?),
        Timestamp::from_datetime(row.try_get("updated_at").map_err(&read)?),
    ))
}

fn row_to_player(row: &PgRow) -> Result<Player, DomainError> {
    let read = db_error("read player");
    let status: String = row.try_get("status").map_err(&read)?;
    let attributes: JsonValue = row.try_get("attributes").map_err(&read)?;
    let history: JsonValue = row.try_get("bid_history").map_err(&read)?;
    let sold_to: Option<uuid::Uuid> = row.try_get("sold_to").map_err(&read)?;
    let sold_price: Option<i64> = row.try_get("sold_price").map_err(&read)?;

    Ok(Player::reconstitute(
        PlayerId::from_uuid(row.try_get("id").map_err(&read)?),
        AuctionId::from_uuid(row.try_get("auction_id").map_err(&read)?),
        row.try_get("name").map_err(&read)?,
        amount_from_db(row.try_get("base_price").map_err(&read)?)?,
        row.try_get("icon").map_err(&read)?,
        from_json::<Map<String, JsonValue>>(attributes)?,
        status.parse::<PlayerStatus>().map_err(invalid_row)?,
        sold_to.map(BidderId::from_uuid),
        sold_price.map(amount_from_db).transpose()?,
        from_json::<Vec<Bid>>(history)?,
    ))
}

fn row_to_bidder(row: &PgRow) -> Result<Bidder, DomainError> {
    let read = db_error("read bidder");
    let user: Option<String> = row.try_get("user_id").map_err(&read)?;

    Ok(Bidder::reconstitute(
        BidderId::from_uuid(row.try_get("id").map_err(&read)?),
        AuctionId::from_uuid(row.try_get("auction_id").map_err(&read)?),
        user.map(UserId::new).transpose().map_err(invalid_row)?,
        row.try_get("name").map_err(&read)?,
        row.try_get("team_name").map_err(&read)?,
        amount_from_db(row.try_get("total_purse").map_err(&read)?)?,
        amount_from_db(row.try_get("spent").map_err(&read)?)?,
    ))
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", context, e))
}

fn invalid_row(e: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored value: {}", e))
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<JsonValue, DomainError> {
    serde_json::to_value(value).map_err(invalid_row)
}

fn from_json<T: serde::de::DeserializeOwned>(value: JsonValue) -> Result<T, DomainError> {
    serde_json::from_value(value).map_err(invalid_row)
}

fn amount_to_db(amount: Amount) -> Result<i64, DomainError> {
    i64::try_from(amount.value()).map_err(invalid_row)
}

fn amount_from_db(value: i64) -> Result<Amount, DomainError> {
    u64::try_from(value).map(Amount::new).map_err(invalid_row)
}

fn version_to_db(version: u64) -> Result<i64, DomainError> {
    i64::try_from(version).map_err(invalid_row)
}

fn version_from_db(version: i64) -> Result<u64, DomainError> {
    u64::try_from(version).map_err(invalid_row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_beyond_bigint_are_rejected() {
        assert!(amount_to_db(Amount::new(u64::MAX)).is_err());
        assert_eq!(amount_to_db(Amount::new(600)).unwrap(), 600);
    }

    #[test]
    fn negative_stored_amounts_are_rejected() {
        assert!(amount_from_db(-1).is_err());
        assert_eq!(amount_from_db(600).unwrap(), Amount::new(600));
    }

    #[test]
    fn db_errors_name_the_failed_step() {
        let err = db_error("update bidder")(sqlx::Error::RowNotFound);
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.starts_with("Failed to update bidder"));
    }
}
