use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct IpAddress {
    pub id: i32,
    pub uuid: Uuid,
    pub box_id: i32,
    /// Canonical textual form of a v4 or v6 address
    pub address: String,
    pub visible: bool,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewIpAddress {
    pub box_id: i32,
    pub address: String,
    pub visible: bool,
}
