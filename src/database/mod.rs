pub mod manager;
pub mod models;
pub mod schema;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use store::{GameStore, MemoryStore, PgStore, StoreTx};
