use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{GameStore, StoreTx};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    Corporation, Flag, GameBox, GameLevel, Hint, IpAddress, MarketItem, NewCorporation, NewFlag,
    NewGameBox, NewGameLevel, NewHint, NewIpAddress, NewMarketItem, NewTeam, Team,
};

const LEVEL_COLUMNS: &str = "id, uuid, number, buyout, next_level_id, created";
const CORPORATION_COLUMNS: &str = "id, uuid, name, created";
const BOX_COLUMNS: &str = "id, uuid, corporation_id, game_level_id, name, description, \
     difficulty, operating_system, autoformat, created";
const FLAG_COLUMNS: &str = "id, uuid, box_id, name, token, flag_type, description, value, \
     capture_message, created";
const HINT_COLUMNS: &str = "id, uuid, box_id, price, description, created";
const IP_COLUMNS: &str = "id, uuid, box_id, address, visible, created";
const MARKET_ITEM_COLUMNS: &str = "id, uuid, name, price, description, created";
const TEAM_COLUMNS: &str = "id, uuid, name, motto, created";

/// Store backed by the tables in `database::schema`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DatabaseError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl PgTx {
    async fn execute_one(
        &mut self,
        query: sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments>,
        what: &str,
    ) -> Result<(), DatabaseError> {
        let result = query.execute(&mut *self.tx).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(what.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn lock_levels(&mut self) -> Result<(), DatabaseError> {
        // Conflicts with itself, so concurrent sequencers queue up here
        sqlx::query("LOCK TABLE game_levels IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn list_levels(&mut self) -> Result<Vec<GameLevel>, DatabaseError> {
        let sql = format!("SELECT {} FROM game_levels", LEVEL_COLUMNS);
        Ok(sqlx::query_as::<_, GameLevel>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn level_by_uuid(&mut self, uuid: Uuid) -> Result<Option<GameLevel>, DatabaseError> {
        let sql = format!("SELECT {} FROM game_levels WHERE uuid = $1", LEVEL_COLUMNS);
        Ok(sqlx::query_as::<_, GameLevel>(&sql)
            .bind(uuid)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn level_by_number(&mut self, number: i32) -> Result<Option<GameLevel>, DatabaseError> {
        let sql = format!("SELECT {} FROM game_levels WHERE number = $1", LEVEL_COLUMNS);
        Ok(sqlx::query_as::<_, GameLevel>(&sql)
            .bind(number)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn create_level(&mut self, level: NewGameLevel) -> Result<GameLevel, DatabaseError> {
        let sql = format!(
            "INSERT INTO game_levels (uuid, number, buyout) VALUES ($1, $2, $3) RETURNING {}",
            LEVEL_COLUMNS
        );
        Ok(sqlx::query_as::<_, GameLevel>(&sql)
            .bind(Uuid::new_v4())
            .bind(level.number)
            .bind(level.buyout)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_level(&mut self, level: &GameLevel) -> Result<(), DatabaseError> {
        let query = sqlx::query(
            "UPDATE game_levels SET number = $2, buyout = $3, next_level_id = $4 WHERE id = $1",
        )
        .bind(level.id)
        .bind(level.number)
        .bind(level.buyout)
        .bind(level.next_level_id);
        self.execute_one(query, "game level").await
    }

    async fn delete_level(&mut self, id: i32) -> Result<(), DatabaseError> {
        let query = sqlx::query("DELETE FROM game_levels WHERE id = $1").bind(id);
        self.execute_one(query, "game level").await
    }

    async fn list_corporations(&mut self) -> Result<Vec<Corporation>, DatabaseError> {
        let sql = format!("SELECT {} FROM corporations ORDER BY id", CORPORATION_COLUMNS);
        Ok(sqlx::query_as::<_, Corporation>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn corporation_by_uuid(
        &mut self,
        uuid: Uuid,
    ) -> Result<Option<Corporation>, DatabaseError> {
        let sql = format!("SELECT {} FROM corporations WHERE uuid = $1", CORPORATION_COLUMNS);
        Ok(sqlx::query_as::<_, Corporation>(&sql)
            .bind(uuid)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn corporation_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<Corporation>, DatabaseError> {
        let sql = format!("SELECT {} FROM corporations WHERE name = $1", CORPORATION_COLUMNS);
        Ok(sqlx::query_as::<_, Corporation>(&sql)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn create_corporation(
        &mut self,
        corporation: NewCorporation,
    ) -> Result<Corporation, DatabaseError> {
        let sql = format!(
            "INSERT INTO corporations (uuid, name) VALUES ($1, $2) RETURNING {}",
            CORPORATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Corporation>(&sql)
            .bind(Uuid::new_v4())
            .bind(corporation.name)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_corporation(
        &mut self,
        corporation: &Corporation,
    ) -> Result<(), DatabaseError> {
        let query = sqlx::query("UPDATE corporations SET name = $2 WHERE id = $1")
            .bind(corporation.id)
            .bind(&corporation.name);
        self.execute_one(query, "corporation").await
    }

    async fn delete_corporation(&mut self, id: i32) -> Result<(), DatabaseError> {
        let query = sqlx::query("DELETE FROM corporations WHERE id = $1").bind(id);
        self.execute_one(query, "corporation").await
    }

    async fn list_boxes(&mut self) -> Result<Vec<GameBox>, DatabaseError> {
        let sql = format!("SELECT {} FROM boxes ORDER BY id", BOX_COLUMNS);
        Ok(sqlx::query_as::<_, GameBox>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn box_by_uuid(&mut self, uuid: Uuid) -> Result<Option<GameBox>, DatabaseError> {
        let sql = format!("SELECT {} FROM boxes WHERE uuid = $1", BOX_COLUMNS);
        Ok(sqlx::query_as::<_, GameBox>(&sql)
            .bind(uuid)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn box_by_name(&mut self, name: &str) -> Result<Option<GameBox>, DatabaseError> {
        let sql = format!("SELECT {} FROM boxes WHERE name = $1", BOX_COLUMNS);
        Ok(sqlx::query_as::<_, GameBox>(&sql)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn count_boxes_in_level(&mut self, level_id: i32) -> Result<i64, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM boxes WHERE game_level_id = $1")
            .bind(level_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count.0)
    }

    async fn create_box(&mut self, game_box: NewGameBox) -> Result<GameBox, DatabaseError> {
        let sql = format!(
            "INSERT INTO boxes (uuid, corporation_id, game_level_id, name, description, \
             difficulty, operating_system, autoformat) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            BOX_COLUMNS
        );
        Ok(sqlx::query_as::<_, GameBox>(&sql)
            .bind(Uuid::new_v4())
            .bind(game_box.corporation_id)
            .bind(game_box.game_level_id)
            .bind(game_box.name)
            .bind(game_box.description)
            .bind(game_box.difficulty)
            .bind(game_box.operating_system)
            .bind(game_box.autoformat)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_box(&mut self, game_box: &GameBox) -> Result<(), DatabaseError> {
        let query = sqlx::query(
            "UPDATE boxes SET corporation_id = $2, game_level_id = $3, name = $4, \
             description = $5, difficulty = $6, operating_system = $7, autoformat = $8 \
             WHERE id = $1",
        )
        .bind(game_box.id)
        .bind(game_box.corporation_id)
        .bind(game_box.game_level_id)
        .bind(&game_box.name)
        .bind(&game_box.description)
        .bind(&game_box.difficulty)
        .bind(&game_box.operating_system)
        .bind(game_box.autoformat);
        self.execute_one(query, "box").await
    }

    async fn delete_box(&mut self, id: i32) -> Result<(), DatabaseError> {
        let query = sqlx::query("DELETE FROM boxes WHERE id = $1").bind(id);
        self.execute_one(query, "box").await
    }

    async fn list_flags(&mut self) -> Result<Vec<Flag>, DatabaseError> {
        let sql = format!("SELECT {} FROM flags ORDER BY id", FLAG_COLUMNS);
        Ok(sqlx::query_as::<_, Flag>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn flag_by_uuid(&mut self, uuid: Uuid) -> Result<Option<Flag>, DatabaseError> {
        let sql = format!("SELECT {} FROM flags WHERE uuid = $1", FLAG_COLUMNS);
        Ok(sqlx::query_as::<_, Flag>(&sql)
            .bind(uuid)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn create_flag(&mut self, flag: NewFlag) -> Result<Flag, DatabaseError> {
        let sql = format!(
            "INSERT INTO flags (uuid, box_id, name, token, flag_type, description, value, \
             capture_message) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            FLAG_COLUMNS
        );
        Ok(sqlx::query_as::<_, Flag>(&sql)
            .bind(Uuid::new_v4())
            .bind(flag.box_id)
            .bind(flag.name)
            .bind(flag.token)
            .bind(flag.kind.as_str())
            .bind(flag.description)
            .bind(flag.value)
            .bind(flag.capture_message)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_flag(&mut self, flag: &Flag) -> Result<(), DatabaseError> {
        let query = sqlx::query(
            "UPDATE flags SET box_id = $2, name = $3, token = $4, description = $5, \
             value = $6, capture_message = $7 WHERE id = $1",
        )
        .bind(flag.id)
        .bind(flag.box_id)
        .bind(&flag.name)
        .bind(&flag.token)
        .bind(&flag.description)
        .bind(flag.value)
        .bind(&flag.capture_message);
        self.execute_one(query, "flag").await
    }

    async fn delete_flag(&mut self, id: i32) -> Result<(), DatabaseError> {
        let query = sqlx::query("DELETE FROM flags WHERE id = $1").bind(id);
        self.execute_one(query, "flag").await
    }

    async fn list_hints(&mut self) -> Result<Vec<Hint>, DatabaseError> {
        let sql = format!("SELECT {} FROM hints ORDER BY id", HINT_COLUMNS);
        Ok(sqlx::query_as::<_, Hint>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn hint_by_uuid(&mut self, uuid: Uuid) -> Result<Option<Hint>, DatabaseError> {
        let sql = format!("SELECT {} FROM hints WHERE uuid = $1", HINT_COLUMNS);
        Ok(sqlx::query_as::<_, Hint>(&sql)
            .bind(uuid)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn create_hint(&mut self, hint: NewHint) -> Result<Hint, DatabaseError> {
        let sql = format!(
            "INSERT INTO hints (uuid, box_id, price, description) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            HINT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Hint>(&sql)
            .bind(Uuid::new_v4())
            .bind(hint.box_id)
            .bind(hint.price)
            .bind(hint.description)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_hint(&mut self, hint: &Hint) -> Result<(), DatabaseError> {
        let query = sqlx::query("UPDATE hints SET price = $2, description = $3 WHERE id = $1")
            .bind(hint.id)
            .bind(hint.price)
            .bind(&hint.description);
        self.execute_one(query, "hint").await
    }

    async fn delete_hint(&mut self, id: i32) -> Result<(), DatabaseError> {
        let query = sqlx::query("DELETE FROM hints WHERE id = $1").bind(id);
        self.execute_one(query, "hint").await
    }

    async fn list_ip_addresses(&mut self) -> Result<Vec<IpAddress>, DatabaseError> {
        let sql = format!("SELECT {} FROM ip_addresses ORDER BY id", IP_COLUMNS);
        Ok(sqlx::query_as::<_, IpAddress>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn ip_by_uuid(&mut self, uuid: Uuid) -> Result<Option<IpAddress>, DatabaseError> {
        let sql = format!("SELECT {} FROM ip_addresses WHERE uuid = $1", IP_COLUMNS);
        Ok(sqlx::query_as::<_, IpAddress>(&sql)
            .bind(uuid)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn ip_by_address(&mut self, address: &str) -> Result<Option<IpAddress>, DatabaseError> {
        let sql = format!("SELECT {} FROM ip_addresses WHERE address = $1", IP_COLUMNS);
        Ok(sqlx::query_as::<_, IpAddress>(&sql)
            .bind(address)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn create_ip(&mut self, ip: NewIpAddress) -> Result<IpAddress, DatabaseError> {
        let sql = format!(
            "INSERT INTO ip_addresses (uuid, box_id, address, visible) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            IP_COLUMNS
        );
        Ok(sqlx::query_as::<_, IpAddress>(&sql)
            .bind(Uuid::new_v4())
            .bind(ip.box_id)
            .bind(ip.address)
            .bind(ip.visible)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn delete_ip(&mut self, id: i32) -> Result<(), DatabaseError> {
        let query = sqlx::query("DELETE FROM ip_addresses WHERE id = $1").bind(id);
        self.execute_one(query, "ip address").await
    }

    async fn list_market_items(&mut self) -> Result<Vec<MarketItem>, DatabaseError> {
        let sql = format!("SELECT {} FROM market_items ORDER BY id", MARKET_ITEM_COLUMNS);
        Ok(sqlx::query_as::<_, MarketItem>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn market_item_by_uuid(
        &mut self,
        uuid: Uuid,
    ) -> Result<Option<MarketItem>, DatabaseError> {
        let sql = format!("SELECT {} FROM market_items WHERE uuid = $1", MARKET_ITEM_COLUMNS);
        Ok(sqlx::query_as::<_, MarketItem>(&sql)
            .bind(uuid)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn create_market_item(
        &mut self,
        item: NewMarketItem,
    ) -> Result<MarketItem, DatabaseError> {
        let sql = format!(
            "INSERT INTO market_items (uuid, name, price, description) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            MARKET_ITEM_COLUMNS
        );
        Ok(sqlx::query_as::<_, MarketItem>(&sql)
            .bind(Uuid::new_v4())
            .bind(item.name)
            .bind(item.price)
            .bind(item.description)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_market_item(&mut self, item: &MarketItem) -> Result<(), DatabaseError> {
        let query = sqlx::query("UPDATE market_items SET price = $2 WHERE id = $1")
            .bind(item.id)
            .bind(item.price);
        self.execute_one(query, "market item").await
    }

    async fn list_teams(&mut self) -> Result<Vec<Team>, DatabaseError> {
        let sql = format!("SELECT {} FROM teams ORDER BY id", TEAM_COLUMNS);
        Ok(sqlx::query_as::<_, Team>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn team_by_name(&mut self, name: &str) -> Result<Option<Team>, DatabaseError> {
        let sql = format!("SELECT {} FROM teams WHERE name = $1", TEAM_COLUMNS);
        Ok(sqlx::query_as::<_, Team>(&sql)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn create_team(&mut self, team: NewTeam) -> Result<Team, DatabaseError> {
        let sql = format!(
            "INSERT INTO teams (uuid, name, motto) VALUES ($1, $2, $3) RETURNING {}",
            TEAM_COLUMNS
        );
        Ok(sqlx::query_as::<_, Team>(&sql)
            .bind(Uuid::new_v4())
            .bind(team.name)
            .bind(team.motto)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }
}
