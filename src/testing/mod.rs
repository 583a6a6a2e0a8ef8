use std::sync::Arc;

use crate::database::models::{Corporation, GameLevel, MarketItem, NewCorporation, NewMarketItem};
use crate::database::store::{GameStore, MemoryStore};
use crate::services::{AdminService, GameLevelSequencer};

/// Services over a fresh in-memory store, seeded with one corporation and the
/// level 0 head
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub admin: AdminService,
    pub levels: GameLevelSequencer,
    pub corporation: Corporation,
    pub head: GameLevel,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let admin = AdminService::new(store.clone());
        let levels = GameLevelSequencer::new(store.clone());

        let head = levels.insert("0", "0").await.expect("seed head level");
        let mut tx = store.begin().await.expect("begin");
        let corporation = tx
            .create_corporation(NewCorporation {
                name: "Initech".into(),
            })
            .await
            .expect("seed corporation");
        tx.commit().await.expect("commit");

        Self {
            store,
            admin,
            levels,
            corporation,
            head,
        }
    }

    /// Market items have no create form, so tests insert them directly
    pub async fn seed_market_item(&self, item: NewMarketItem) -> MarketItem {
        let mut tx = self.store.begin().await.expect("begin");
        let item = tx.create_market_item(item).await.expect("seed market item");
        tx.commit().await.expect("commit");
        item
    }
}
