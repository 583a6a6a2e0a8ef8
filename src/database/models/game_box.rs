use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A target host, owned by a corporation and unlocked at a game level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GameBox {
    pub id: i32,
    pub uuid: Uuid,
    pub corporation_id: i32,
    pub game_level_id: i32,
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub operating_system: String,
    pub autoformat: bool,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGameBox {
    pub corporation_id: i32,
    pub game_level_id: i32,
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub operating_system: String,
    pub autoformat: bool,
}
