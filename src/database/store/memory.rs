use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{GameStore, StoreTx};
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Corporation, Flag, GameBox, GameLevel, Hint, IpAddress, MarketItem, NewCorporation, NewFlag,
    NewGameBox, NewGameLevel, NewHint, NewIpAddress, NewMarketItem, NewTeam, Team,
};

/// Process-local store for development and tests.
///
/// Transactions are serialized: `begin` holds the only lock on the tables until
/// the transaction commits or is dropped, and works on a private copy that
/// replaces the shared tables on commit. Foreign keys and the deferred
/// uniqueness of level numbers behave as in the PostgreSQL schema.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DatabaseError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

trait Row: Clone {
    const TABLE: &'static str;
    fn id(&self) -> i32;
}

macro_rules! impl_row {
    ($($ty:ty => $table:literal),* $(,)?) => {
        $(impl Row for $ty {
            const TABLE: &'static str = $table;
            fn id(&self) -> i32 {
                self.id
            }
        })*
    };
}

impl_row! {
    GameLevel => "game_levels",
    Corporation => "corporations",
    GameBox => "boxes",
    Flag => "flags",
    Hint => "hints",
    IpAddress => "ip_addresses",
    MarketItem => "market_items",
    Team => "teams",
}

#[derive(Debug, Clone)]
struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Row> Table<T> {
    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.values().find(|row| pred(row)).cloned()
    }

    fn insert(&mut self, build: impl FnOnce(i32) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn replace(&mut self, row: &T) -> Result<(), DatabaseError> {
        match self.rows.get_mut(&row.id()) {
            Some(slot) => {
                *slot = row.clone();
                Ok(())
            }
            None => Err(Self::missing(row.id())),
        }
    }

    fn remove(&mut self, id: i32) -> Result<T, DatabaseError> {
        self.rows.remove(&id).ok_or_else(|| Self::missing(id))
    }

    /// Drop every row matching `pred`, returning the removed ids
    fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> HashSet<i32> {
        let doomed: HashSet<i32> = self
            .rows
            .values()
            .filter(|row| pred(row))
            .map(|row| row.id())
            .collect();
        self.rows.retain(|id, _| !doomed.contains(id));
        doomed
    }

    fn missing(id: i32) -> DatabaseError {
        DatabaseError::NotFound(format!("{} row {}", T::TABLE, id))
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    levels: Table<GameLevel>,
    corporations: Table<Corporation>,
    boxes: Table<GameBox>,
    flags: Table<Flag>,
    hints: Table<Hint>,
    ip_addresses: Table<IpAddress>,
    market_items: Table<MarketItem>,
    teams: Table<Team>,
}

impl Tables {
    fn remove_box_children(&mut self, box_ids: &HashSet<i32>) {
        self.flags.remove_where(|flag| box_ids.contains(&flag.box_id));
        self.hints.remove_where(|hint| box_ids.contains(&hint.box_id));
        self.ip_addresses.remove_where(|ip| box_ids.contains(&ip.box_id));
    }

    /// Constraints PostgreSQL checks at commit time
    fn check_deferred(&self) -> Result<(), DatabaseError> {
        let mut seen = HashSet::new();
        for level in self.levels.rows.values() {
            if !seen.insert(level.number) {
                return Err(DatabaseError::QueryError(format!(
                    "duplicate key value violates unique constraint \"game_levels_number_key\" (number)=({})",
                    level.number
                )));
            }
        }
        Ok(())
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_levels(&mut self) -> Result<(), DatabaseError> {
        // Already exclusive for the whole transaction
        Ok(())
    }

    async fn list_levels(&mut self) -> Result<Vec<GameLevel>, DatabaseError> {
        Ok(self.working.levels.all())
    }

    async fn level_by_uuid(&mut self, uuid: Uuid) -> Result<Option<GameLevel>, DatabaseError> {
        Ok(self.working.levels.find(|level| level.uuid == uuid))
    }

    async fn level_by_number(&mut self, number: i32) -> Result<Option<GameLevel>, DatabaseError> {
        Ok(self.working.levels.find(|level| level.number == number))
    }

    async fn create_level(&mut self, level: NewGameLevel) -> Result<GameLevel, DatabaseError> {
        Ok(self.working.levels.insert(|id| GameLevel {
            id,
            uuid: Uuid::new_v4(),
            number: level.number,
            buyout: level.buyout,
            next_level_id: None,
            created: Utc::now(),
        }))
    }

    async fn update_level(&mut self, level: &GameLevel) -> Result<(), DatabaseError> {
        self.working.levels.replace(level)
    }

    async fn delete_level(&mut self, id: i32) -> Result<(), DatabaseError> {
        if self.working.boxes.find(|b| b.game_level_id == id).is_some() {
            return Err(DatabaseError::QueryError(format!(
                "game_levels row {} is still referenced from boxes",
                id
            )));
        }
        self.working.levels.remove(id)?;
        for level in self.working.levels.rows.values_mut() {
            if level.next_level_id == Some(id) {
                level.next_level_id = None;
            }
        }
        Ok(())
    }

    async fn list_corporations(&mut self) -> Result<Vec<Corporation>, DatabaseError> {
        Ok(self.working.corporations.all())
    }

    async fn corporation_by_uuid(
        &mut self,
        uuid: Uuid,
    ) -> Result<Option<Corporation>, DatabaseError> {
        Ok(self.working.corporations.find(|corp| corp.uuid == uuid))
    }

    async fn corporation_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<Corporation>, DatabaseError> {
        Ok(self.working.corporations.find(|corp| corp.name == name))
    }

    async fn create_corporation(
        &mut self,
        corporation: NewCorporation,
    ) -> Result<Corporation, DatabaseError> {
        Ok(self.working.corporations.insert(|id| Corporation {
            id,
            uuid: Uuid::new_v4(),
            name: corporation.name,
            created: Utc::now(),
        }))
    }

    async fn update_corporation(
        &mut self,
        corporation: &Corporation,
    ) -> Result<(), DatabaseError> {
        self.working.corporations.replace(corporation)
    }

    async fn delete_corporation(&mut self, id: i32) -> Result<(), DatabaseError> {
        self.working.corporations.remove(id)?;
        let box_ids = self.working.boxes.remove_where(|b| b.corporation_id == id);
        self.working.remove_box_children(&box_ids);
        Ok(())
    }

    async fn list_boxes(&mut self) -> Result<Vec<GameBox>, DatabaseError> {
        Ok(self.working.boxes.all())
    }

    async fn box_by_uuid(&mut self, uuid: Uuid) -> Result<Option<GameBox>, DatabaseError> {
        Ok(self.working.boxes.find(|b| b.uuid == uuid))
    }

    async fn box_by_name(&mut self, name: &str) -> Result<Option<GameBox>, DatabaseError> {
        Ok(self.working.boxes.find(|b| b.name == name))
    }

    async fn count_boxes_in_level(&mut self, level_id: i32) -> Result<i64, DatabaseError> {
        Ok(self
            .working
            .boxes
            .rows
            .values()
            .filter(|b| b.game_level_id == level_id)
            .count() as i64)
    }

    async fn create_box(&mut self, game_box: NewGameBox) -> Result<GameBox, DatabaseError> {
        Ok(self.working.boxes.insert(|id| GameBox {
            id,
            uuid: Uuid::new_v4(),
            corporation_id: game_box.corporation_id,
            game_level_id: game_box.game_level_id,
            name: game_box.name,
            description: game_box.description,
            difficulty: game_box.difficulty,
            operating_system: game_box.operating_system,
            autoformat: game_box.autoformat,
            created: Utc::now(),
        }))
    }

    async fn update_box(&mut self, game_box: &GameBox) -> Result<(), DatabaseError> {
        self.working.boxes.replace(game_box)
    }

    async fn delete_box(&mut self, id: i32) -> Result<(), DatabaseError> {
        self.working.boxes.remove(id)?;
        self.working.remove_box_children(&HashSet::from([id]));
        Ok(())
    }

    async fn list_flags(&mut self) -> Result<Vec<Flag>, DatabaseError> {
        Ok(self.working.flags.all())
    }

    async fn flag_by_uuid(&mut self, uuid: Uuid) -> Result<Option<Flag>, DatabaseError> {
        Ok(self.working.flags.find(|flag| flag.uuid == uuid))
    }

    async fn create_flag(&mut self, flag: NewFlag) -> Result<Flag, DatabaseError> {
        Ok(self.working.flags.insert(|id| Flag {
            id,
            uuid: Uuid::new_v4(),
            box_id: flag.box_id,
            name: flag.name,
            token: flag.token,
            flag_type: flag.kind.as_str().to_string(),
            description: flag.description,
            value: flag.value,
            capture_message: flag.capture_message,
            created: Utc::now(),
        }))
    }

    async fn update_flag(&mut self, flag: &Flag) -> Result<(), DatabaseError> {
        self.working.flags.replace(flag)
    }

    async fn delete_flag(&mut self, id: i32) -> Result<(), DatabaseError> {
        self.working.flags.remove(id).map(|_| ())
    }

    async fn list_hints(&mut self) -> Result<Vec<Hint>, DatabaseError> {
        Ok(self.working.hints.all())
    }

    async fn hint_by_uuid(&mut self, uuid: Uuid) -> Result<Option<Hint>, DatabaseError> {
        Ok(self.working.hints.find(|hint| hint.uuid == uuid))
    }

    async fn create_hint(&mut self, hint: NewHint) -> Result<Hint, DatabaseError> {
        Ok(self.working.hints.insert(|id| Hint {
            id,
            uuid: Uuid::new_v4(),
            box_id: hint.box_id,
            price: hint.price,
            description: hint.description,
            created: Utc::now(),
        }))
    }

    async fn update_hint(&mut self, hint: &Hint) -> Result<(), DatabaseError> {
        self.working.hints.replace(hint)
    }

    async fn delete_hint(&mut self, id: i32) -> Result<(), DatabaseError> {
        self.working.hints.remove(id).map(|_| ())
    }

    async fn list_ip_addresses(&mut self) -> Result<Vec<IpAddress>, DatabaseError> {
        Ok(self.working.ip_addresses.all())
    }

    async fn ip_by_uuid(&mut self, uuid: Uuid) -> Result<Option<IpAddress>, DatabaseError> {
        Ok(self.working.ip_addresses.find(|ip| ip.uuid == uuid))
    }

    async fn ip_by_address(&mut self, address: &str) -> Result<Option<IpAddress>, DatabaseError> {
        Ok(self.working.ip_addresses.find(|ip| ip.address == address))
    }

    async fn create_ip(&mut self, ip: NewIpAddress) -> Result<IpAddress, DatabaseError> {
        Ok(self.working.ip_addresses.insert(|id| IpAddress {
            id,
            uuid: Uuid::new_v4(),
            box_id: ip.box_id,
            address: ip.address,
            visible: ip.visible,
            created: Utc::now(),
        }))
    }

    async fn delete_ip(&mut self, id: i32) -> Result<(), DatabaseError> {
        self.working.ip_addresses.remove(id).map(|_| ())
    }

    async fn list_market_items(&mut self) -> Result<Vec<MarketItem>, DatabaseError> {
        Ok(self.working.market_items.all())
    }

    async fn market_item_by_uuid(
        &mut self,
        uuid: Uuid,
    ) -> Result<Option<MarketItem>, DatabaseError> {
        Ok(self.working.market_items.find(|item| item.uuid == uuid))
    }

    async fn create_market_item(
        &mut self,
        item: NewMarketItem,
    ) -> Result<MarketItem, DatabaseError> {
        Ok(self.working.market_items.insert(|id| MarketItem {
            id,
            uuid: Uuid::new_v4(),
            name: item.name,
            price: item.price,
            description: item.description,
            created: Utc::now(),
        }))
    }

    async fn update_market_item(&mut self, item: &MarketItem) -> Result<(), DatabaseError> {
        self.working.market_items.replace(item)
    }

    async fn list_teams(&mut self) -> Result<Vec<Team>, DatabaseError> {
        Ok(self.working.teams.all())
    }

    async fn team_by_name(&mut self, name: &str) -> Result<Option<Team>, DatabaseError> {
        Ok(self.working.teams.find(|team| team.name == name))
    }

    async fn create_team(&mut self, team: NewTeam) -> Result<Team, DatabaseError> {
        Ok(self.working.teams.insert(|id| Team {
            id,
            uuid: Uuid::new_v4(),
            name: team.name,
            motto: team.motto,
            created: Utc::now(),
        }))
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let MemoryTx { mut guard, working } = *self;
        working.check_deferred()?;
        *guard = working;
        Ok(())
    }
}
