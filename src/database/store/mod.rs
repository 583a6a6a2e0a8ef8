pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Corporation, Flag, GameBox, GameLevel, Hint, IpAddress, MarketItem, NewCorporation, NewFlag,
    NewGameBox, NewGameLevel, NewHint, NewIpAddress, NewMarketItem, NewTeam, Team,
};

/// Persistence for the game objects.
///
/// All reads and writes happen through a `StoreTx`. Writes are visible to later
/// reads on the same transaction and become durable only on `commit`; dropping
/// a transaction without committing discards them.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait StoreTx: Send {
    /// Block other writers of the level list until this transaction ends
    async fn lock_levels(&mut self) -> Result<(), DatabaseError>;

    // Game levels (unordered)
    async fn list_levels(&mut self) -> Result<Vec<GameLevel>, DatabaseError>;
    async fn level_by_uuid(&mut self, uuid: Uuid) -> Result<Option<GameLevel>, DatabaseError>;
    async fn level_by_number(&mut self, number: i32) -> Result<Option<GameLevel>, DatabaseError>;
    async fn create_level(&mut self, level: NewGameLevel) -> Result<GameLevel, DatabaseError>;
    async fn update_level(&mut self, level: &GameLevel) -> Result<(), DatabaseError>;
    async fn delete_level(&mut self, id: i32) -> Result<(), DatabaseError>;

    // Corporations
    async fn list_corporations(&mut self) -> Result<Vec<Corporation>, DatabaseError>;
    async fn corporation_by_uuid(&mut self, uuid: Uuid)
        -> Result<Option<Corporation>, DatabaseError>;
    async fn corporation_by_name(&mut self, name: &str)
        -> Result<Option<Corporation>, DatabaseError>;
    async fn create_corporation(
        &mut self,
        corporation: NewCorporation,
    ) -> Result<Corporation, DatabaseError>;
    async fn update_corporation(&mut self, corporation: &Corporation)
        -> Result<(), DatabaseError>;
    /// Also removes the corporation's boxes and everything under them
    async fn delete_corporation(&mut self, id: i32) -> Result<(), DatabaseError>;

    // Boxes
    async fn list_boxes(&mut self) -> Result<Vec<GameBox>, DatabaseError>;
    async fn box_by_uuid(&mut self, uuid: Uuid) -> Result<Option<GameBox>, DatabaseError>;
    async fn box_by_name(&mut self, name: &str) -> Result<Option<GameBox>, DatabaseError>;
    async fn count_boxes_in_level(&mut self, level_id: i32) -> Result<i64, DatabaseError>;
    async fn create_box(&mut self, game_box: NewGameBox) -> Result<GameBox, DatabaseError>;
    async fn update_box(&mut self, game_box: &GameBox) -> Result<(), DatabaseError>;
    /// Also removes the box's flags, hints and IP addresses
    async fn delete_box(&mut self, id: i32) -> Result<(), DatabaseError>;

    // Flags
    async fn list_flags(&mut self) -> Result<Vec<Flag>, DatabaseError>;
    async fn flag_by_uuid(&mut self, uuid: Uuid) -> Result<Option<Flag>, DatabaseError>;
    async fn create_flag(&mut self, flag: NewFlag) -> Result<Flag, DatabaseError>;
    async fn update_flag(&mut self, flag: &Flag) -> Result<(), DatabaseError>;
    async fn delete_flag(&mut self, id: i32) -> Result<(), DatabaseError>;

    // Hints
    async fn list_hints(&mut self) -> Result<Vec<Hint>, DatabaseError>;
    async fn hint_by_uuid(&mut self, uuid: Uuid) -> Result<Option<Hint>, DatabaseError>;
    async fn create_hint(&mut self, hint: NewHint) -> Result<Hint, DatabaseError>;
    async fn update_hint(&mut self, hint: &Hint) -> Result<(), DatabaseError>;
    async fn delete_hint(&mut self, id: i32) -> Result<(), DatabaseError>;

    // IP addresses
    async fn list_ip_addresses(&mut self) -> Result<Vec<IpAddress>, DatabaseError>;
    async fn ip_by_uuid(&mut self, uuid: Uuid) -> Result<Option<IpAddress>, DatabaseError>;
    async fn ip_by_address(&mut self, address: &str) -> Result<Option<IpAddress>, DatabaseError>;
    async fn create_ip(&mut self, ip: NewIpAddress) -> Result<IpAddress, DatabaseError>;
    async fn delete_ip(&mut self, id: i32) -> Result<(), DatabaseError>;

    // Market items
    async fn list_market_items(&mut self) -> Result<Vec<MarketItem>, DatabaseError>;
    async fn market_item_by_uuid(&mut self, uuid: Uuid)
        -> Result<Option<MarketItem>, DatabaseError>;
    async fn create_market_item(
        &mut self,
        item: NewMarketItem,
    ) -> Result<MarketItem, DatabaseError>;
    async fn update_market_item(&mut self, item: &MarketItem) -> Result<(), DatabaseError>;

    // Teams
    async fn list_teams(&mut self) -> Result<Vec<Team>, DatabaseError>;
    async fn team_by_name(&mut self, name: &str) -> Result<Option<Team>, DatabaseError>;
    async fn create_team(&mut self, team: NewTeam) -> Result<Team, DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;
}
