use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{parse_amount, parse_uuid, ServiceError};
use crate::database::manager::DatabaseError;
use crate::database::models::{GameLevel, NewGameLevel};
use crate::database::store::{GameStore, StoreTx};

/// Buyout applied when an edit form leaves the field out
pub const DEFAULT_BUYOUT: i32 = 1;

/// Keeps the game levels a sorted, singly linked list.
///
/// Every structural change (insert, renumber, delete) is followed by a full
/// re-link pass over the stored levels, all inside one store transaction:
///
/// - exactly one level has number 0 (the head)
/// - each level's `next_level_id` is the id of the next level by number
/// - the last level's `next_level_id` is `None`
/// - no two levels share a number
pub struct GameLevelSequencer {
    store: Arc<dyn GameStore>,
    // Held across read-modify-relink-write
    write_lock: Mutex<()>,
}

impl GameLevelSequencer {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Create a level and re-link the whole list.
    ///
    /// The requested number is not checked against existing levels; the
    /// re-link pass settles collisions, and an empty list makes the new level
    /// the head regardless of the number asked for.
    pub async fn insert(&self, number: &str, buyout: &str) -> Result<GameLevel, ServiceError> {
        let number = parse_amount("Level number", number)?;
        let buyout = parse_amount("Buyout", buyout)?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.store.begin().await?;
        tx.lock_levels().await?;

        let created = tx.create_level(NewGameLevel { number, buyout }).await?;
        let levels = relink_stored(tx.as_mut()).await?;
        tx.commit().await?;

        let level = levels
            .into_iter()
            .find(|level| level.id == created.id)
            .unwrap_or(created);
        info!(
            "Created game level {} (requested {}, buyout {})",
            level.number, number, buyout
        );
        Ok(level)
    }

    /// Update a level's number and buyout, then re-link.
    ///
    /// A missing or blank `number` keeps the current one; a missing `buyout`
    /// resets it to `DEFAULT_BUYOUT`.
    pub async fn renumber(
        &self,
        level_uuid: &str,
        number: Option<&str>,
        buyout: Option<&str>,
    ) -> Result<GameLevel, ServiceError> {
        let requested = match number.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(parse_amount("Level number", raw)?),
            None => None,
        };
        let buyout = match buyout {
            Some(raw) => parse_amount("Buyout", raw)?,
            None => DEFAULT_BUYOUT,
        };

        let _guard = self.write_lock.lock().await;
        let mut tx = self.store.begin().await?;
        tx.lock_levels().await?;

        let mut level = find_level(tx.as_mut(), level_uuid)
            .await?
            .ok_or_else(|| ServiceError::not_found("Game level does not exist"))?;

        if let Some(requested) = requested {
            if requested != level.number {
                info!(
                    "Updated game level number {} -> {}",
                    level.number, requested
                );
                level.number = requested;
            }
        }
        if buyout != level.buyout {
            info!(
                "Updated game level {}'s buyout {} -> {}",
                level.number, level.buyout, buyout
            );
            level.buyout = buyout;
        }
        tx.update_level(&level).await?;

        let levels = relink_stored(tx.as_mut()).await?;
        tx.commit().await?;

        Ok(levels
            .into_iter()
            .find(|stored| stored.id == level.id)
            .unwrap_or(level))
    }

    /// Remove a level and re-link whatever is left.
    ///
    /// Levels that still have boxes assigned are refused; move the boxes first.
    pub async fn delete(&self, level_uuid: &str) -> Result<GameLevel, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.store.begin().await?;
        tx.lock_levels().await?;

        let Some(level) = find_level(tx.as_mut(), level_uuid).await? else {
            warn!("Game level ({:?}) does not exist in database", level_uuid);
            return Err(ServiceError::not_found(
                "Game level does not exist in database.",
            ));
        };

        let boxes = tx.count_boxes_in_level(level.id).await?;
        if boxes > 0 {
            return Err(ServiceError::validation(format!(
                "Game level {} still has {} box(es) assigned",
                level.number, boxes
            )));
        }

        let mut remaining: Vec<GameLevel> = tx
            .list_levels()
            .await?
            .into_iter()
            .filter(|other| other.id != level.id)
            .collect();
        let changed = relink(&mut remaining)?;
        persist(tx.as_mut(), &remaining, &changed).await?;
        tx.delete_level(level.id).await?;
        tx.commit().await?;

        info!("Deleted game level {}", level.number);
        Ok(level)
    }

    /// Re-run the pass over the stored levels, returning how many were rewritten
    pub async fn relink(&self) -> Result<usize, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.store.begin().await?;
        tx.lock_levels().await?;

        let mut levels = tx.list_levels().await?;
        let changed = relink(&mut levels)?;
        persist(tx.as_mut(), &levels, &changed).await?;
        tx.commit().await?;

        if !changed.is_empty() {
            info!("Re-linked {} game level(s)", changed.len());
        }
        Ok(changed.len())
    }

    /// All levels from head to tail
    pub async fn levels(&self) -> Result<Vec<GameLevel>, ServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(in_sequence(tx.list_levels().await?))
    }
}

/// Sort, renumber and re-link `levels` in place.
///
/// Levels are ordered by `(number, id)`. The head is forced to number 0, and a
/// level whose number does not exceed its predecessor's is bumped to one past
/// it, so on a collision the level with the lower id keeps the number. Links
/// are then rebuilt front to back with `None` on the tail.
///
/// Returns the indices (into the sorted slice) of levels whose number or link
/// changed. A second call on the result returns nothing. Fails, leaving the
/// numbers partly rewritten, when a bump would run past `i32::MAX`.
pub fn relink(levels: &mut [GameLevel]) -> Result<Vec<usize>, ServiceError> {
    levels.sort_by_key(|level| (level.number, level.id));
    let before: Vec<(i32, Option<i32>)> = levels
        .iter()
        .map(|level| (level.number, level.next_level_id))
        .collect();

    let mut previous: Option<i32> = None;
    for level in levels.iter_mut() {
        level.number = match previous {
            None => 0,
            Some(prev) if level.number <= prev => prev.checked_add(1).ok_or_else(|| {
                ServiceError::validation(format!(
                    "Level number {} is taken and no higher number is free",
                    level.number
                ))
            })?,
            Some(_) => level.number,
        };
        previous = Some(level.number);
    }

    let ids: Vec<i32> = levels.iter().map(|level| level.id).collect();
    for (index, level) in levels.iter_mut().enumerate() {
        level.next_level_id = ids.get(index + 1).copied();
    }

    Ok(levels
        .iter()
        .zip(before)
        .enumerate()
        .filter(|(_, (level, old))| (level.number, level.next_level_id) != *old)
        .map(|(index, _)| index)
        .collect())
}

/// Levels ordered head to tail
pub fn in_sequence(mut levels: Vec<GameLevel>) -> Vec<GameLevel> {
    levels.sort_by_key(|level| (level.number, level.id));
    levels
}

async fn find_level(
    tx: &mut dyn StoreTx,
    level_uuid: &str,
) -> Result<Option<GameLevel>, DatabaseError> {
    match parse_uuid(level_uuid) {
        Some(uuid) => tx.level_by_uuid(uuid).await,
        None => Ok(None),
    }
}

async fn relink_stored(tx: &mut dyn StoreTx) -> Result<Vec<GameLevel>, ServiceError> {
    let mut levels = tx.list_levels().await?;
    let changed = relink(&mut levels)?;
    persist(tx, &levels, &changed).await?;
    Ok(levels)
}

async fn persist(
    tx: &mut dyn StoreTx,
    levels: &[GameLevel],
    changed: &[usize],
) -> Result<(), DatabaseError> {
    for &index in changed {
        let level = &levels[index];
        debug!(
            "Re-linked level {} (id {}) -> {:?}",
            level.number, level.id, level.next_level_id
        );
        tx.update_level(level).await?;
    }
    Ok(())
}
