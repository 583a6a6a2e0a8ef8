pub mod game_objects;
pub mod levels;

pub use game_objects::AdminService;
pub use levels::GameLevelSequencer;

use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Failures surfaced by the admin services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller-supplied data failed a precondition
    #[error("{0}")]
    Validation(String),

    /// A referenced identifier does not resolve to a live record
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }
}

/// Parse a form field holding a non-negative integer (level numbers, prices, buyouts)
pub(crate) fn parse_amount(field: &str, raw: &str) -> Result<i32, ServiceError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|value| *value >= 0)
        .ok_or_else(|| {
            ServiceError::validation(format!("{} must be a non-negative integer", field))
        })
}

/// Form lookups by a malformed uuid behave like lookups of a missing record
pub(crate) fn parse_uuid(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Trimmed, non-empty, and at most `max` characters
pub(crate) fn check_name(field: &str, raw: &str, max: usize) -> Result<String, ServiceError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(format!("{} cannot be empty", field)));
    }
    if value.chars().count() > max {
        return Err(ServiceError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}
