use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MarketItem {
    pub id: i32,
    pub uuid: Uuid,
    pub name: String,
    pub price: i32,
    pub description: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMarketItem {
    pub name: String,
    pub price: i32,
    pub description: String,
}
