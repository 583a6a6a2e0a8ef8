use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Hint {
    pub id: i32,
    pub uuid: Uuid,
    pub box_id: i32,
    pub price: i32,
    pub description: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHint {
    pub box_id: i32,
    pub price: i32,
    pub description: String,
}
