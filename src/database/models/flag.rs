use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a submitted token is compared against the flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    Static,
    Regex,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Static => "static",
            FlagKind::Regex => "regex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Flag {
    pub id: i32,
    pub uuid: Uuid,
    pub box_id: i32,
    pub name: String,
    pub token: String,
    /// Stored as the `FlagKind::as_str` spelling
    pub flag_type: String,
    pub description: String,
    pub value: i32,
    pub capture_message: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFlag {
    pub box_id: i32,
    pub kind: FlagKind,
    pub name: String,
    pub token: String,
    pub description: String,
    pub value: i32,
    pub capture_message: String,
}
