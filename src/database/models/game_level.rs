use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One rank in the game's progression.
///
/// Levels form a singly linked list ordered by `number`: `next_level_id` always
/// names the level with the next-higher number and is `None` only on the last
/// one. The list is maintained by `GameLevelSequencer`; nothing else should
/// write `number` or `next_level_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GameLevel {
    pub id: i32,
    pub uuid: Uuid,
    pub number: i32,
    pub buyout: i32,
    pub next_level_id: Option<i32>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewGameLevel {
    pub number: i32,
    pub buyout: i32,
}
