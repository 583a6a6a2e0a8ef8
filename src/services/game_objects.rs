use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::levels::in_sequence;
use super::{check_name, parse_amount, parse_uuid, ServiceError};
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Corporation, Flag, FlagKind, GameBox, GameLevel, Hint, IpAddress, MarketItem, NewCorporation,
    NewFlag, NewGameBox, NewHint, NewIpAddress, NewMarketItem, NewTeam, Team,
};
use crate::database::store::{GameStore, StoreTx};

const CORPORATION_NAME_MAX: usize = 32;
const BOX_NAME_MAX: usize = 32;
const BOX_FIELD_MAX: usize = 16;
const FLAG_NAME_MAX: usize = 64;
const TEAM_NAME_MAX: usize = 24;
const TEAM_MOTTO_MAX: usize = 32;

/// Market catalog installed into an empty store: (name, price, description)
pub const DEFAULT_MARKET_ITEMS: &[(&str, i32, &str)] = &[
    (
        "Federal Reserve",
        5000,
        "Gain access to the internal messaging system of the Federal Reserve",
    ),
    (
        "Password Security",
        7500,
        "Upgrade your team's password hashes to a stronger algorithm",
    ),
    (
        "Source Code Market",
        7500,
        "Buy the leaked source code of other teams' targets",
    ),
    ("SWAT", 10000, "Send a SWAT team after another player"),
];

// Form bodies. Field names follow the admin panel's forms; absent fields read as "".

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewCorporationForm {
    pub corporation_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditCorporationForm {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewBoxForm {
    pub name: String,
    pub corporation_uuid: String,
    /// Level *number*, not uuid
    pub game_level: String,
    pub description: String,
    pub difficulty: String,
    pub operating_system: Option<String>,
    pub autoformat: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditBoxForm {
    pub uuid: String,
    pub name: String,
    pub corporation_uuid: String,
    pub description: String,
    pub difficulty: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BoxLevelForm {
    pub box_uuid: String,
    pub level_uuid: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewFlagForm {
    pub box_uuid: String,
    pub flag_name: String,
    pub token: String,
    pub description: String,
    pub reward: String,
    pub capture_message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditFlagForm {
    pub uuid: String,
    pub name: String,
    pub token: String,
    pub description: String,
    pub value: String,
    pub capture_message: String,
    pub box_uuid: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IpForm {
    pub box_uuid: String,
    pub ip_address: String,
    #[serde(alias = "visable")]
    pub visible: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewHintForm {
    pub box_uuid: String,
    pub price: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditHintForm {
    pub uuid: String,
    pub price: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MarketItemForm {
    pub item_uuid: String,
    pub price: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewTeamForm {
    pub team_name: String,
    pub motto: String,
}

/// Body of every delete form
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UuidForm {
    #[serde(alias = "ip_uuid")]
    pub uuid: String,
}

/// Object types the ajax data endpoint can describe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    GameLevel,
    Corporation,
    Flag,
    Box,
    Hint,
}

impl FromStr for ObjectKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "game_level" => Ok(ObjectKind::GameLevel),
            "corporation" => Ok(ObjectKind::Corporation),
            "flag" => Ok(ObjectKind::Flag),
            "box" => Ok(ObjectKind::Box),
            "hint" => Ok(ObjectKind::Hint),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoxView {
    #[serde(flatten)]
    pub game_box: GameBox,
    pub flags: Vec<Flag>,
    pub hints: Vec<Hint>,
    pub ip_addresses: Vec<IpAddress>,
}

#[derive(Debug, Serialize)]
pub struct CorporationView {
    #[serde(flatten)]
    pub corporation: Corporation,
    pub boxes: Vec<BoxView>,
}

#[derive(Debug, Serialize)]
pub struct LevelView {
    #[serde(flatten)]
    pub level: GameLevel,
    pub boxes: Vec<GameBox>,
}

/// Validation and persistence for everything except the level list itself
pub struct AdminService {
    store: Arc<dyn GameStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store }
    }

    // -- corporations ------------------------------------------------------

    pub async fn create_corporation(
        &self,
        form: &NewCorporationForm,
    ) -> Result<Corporation, ServiceError> {
        let name = check_name("Corporation name", &form.corporation_name, CORPORATION_NAME_MAX)?;

        let mut tx = self.store.begin().await?;
        if tx.corporation_by_name(&name).await?.is_some() {
            return Err(ServiceError::validation("Corporation name already exists"));
        }
        let corporation = tx.create_corporation(NewCorporation { name }).await?;
        tx.commit().await?;

        info!("Created corporation {}", corporation.name);
        Ok(corporation)
    }

    pub async fn edit_corporation(
        &self,
        form: &EditCorporationForm,
    ) -> Result<Corporation, ServiceError> {
        let mut tx = self.store.begin().await?;
        let mut corporation = find_corporation(tx.as_mut(), &form.uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Corporation does not exist"))?;

        let name = check_name("Corporation name", &form.name, CORPORATION_NAME_MAX)?;
        if name != corporation.name {
            if tx.corporation_by_name(&name).await?.is_some() {
                return Err(ServiceError::validation("Corporation name already exists"));
            }
            info!("Updated corporation name {} -> {}", corporation.name, name);
            corporation.name = name;
            tx.update_corporation(&corporation).await?;
            tx.commit().await?;
        }
        Ok(corporation)
    }

    pub async fn delete_corporation(&self, form: &UuidForm) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let Some(corporation) = find_corporation(tx.as_mut(), &form.uuid).await? else {
            warn!("Corporation ({:?}) does not exist in database", form.uuid);
            return Err(ServiceError::not_found(
                "Corporation does not exist in database.",
            ));
        };
        tx.delete_corporation(corporation.id).await?;
        tx.commit().await?;

        info!("Deleted corporation: {}", corporation.name);
        Ok(())
    }

    // -- boxes -------------------------------------------------------------

    pub async fn create_box(&self, form: &NewBoxForm) -> Result<GameBox, ServiceError> {
        let name = check_name("Box name", &form.name, BOX_NAME_MAX)?;
        let difficulty = bounded("Difficulty", &form.difficulty, BOX_FIELD_MAX)?;
        let operating_system = match form.operating_system.as_deref().map(str::trim) {
            Some(os) if !os.is_empty() => bounded("Operating system", os, BOX_FIELD_MAX)?,
            _ => "?".to_string(),
        };

        let mut tx = self.store.begin().await?;
        if tx.box_by_name(&name).await?.is_some() {
            return Err(ServiceError::validation("Box name already exists"));
        }
        let corporation = find_corporation(tx.as_mut(), &form.corporation_uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Corporation does not exist"))?;
        let level = match form.game_level.trim().parse::<i32>() {
            Ok(number) => tx.level_by_number(number).await?,
            Err(_) => None,
        }
        .ok_or_else(|| ServiceError::validation("Game level does not exist"))?;

        let game_box = tx
            .create_box(NewGameBox {
                corporation_id: corporation.id,
                game_level_id: level.id,
                name,
                description: form.description.clone(),
                difficulty,
                operating_system,
                autoformat: form.autoformat == "true",
            })
            .await?;
        tx.commit().await?;

        info!(
            "Created box {} for {} at level {}",
            game_box.name, corporation.name, level.number
        );
        Ok(game_box)
    }

    pub async fn edit_box(&self, form: &EditBoxForm) -> Result<GameBox, ServiceError> {
        let mut tx = self.store.begin().await?;
        let mut game_box = find_box(tx.as_mut(), &form.uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Box does not exist"))?;

        let name = check_name("Box name", &form.name, BOX_NAME_MAX)?;
        if name != game_box.name {
            if tx.box_by_name(&name).await?.is_some() {
                return Err(ServiceError::validation("Box name already exists"));
            }
            info!("Updated box name {} -> {}", game_box.name, name);
            game_box.name = name;
        }

        let corporation = find_corporation(tx.as_mut(), &form.corporation_uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Corporation does not exist"))?;
        if corporation.id != game_box.corporation_id {
            info!(
                "Updated {}'s corporation {} -> {}",
                game_box.name, game_box.corporation_id, corporation.id
            );
            game_box.corporation_id = corporation.id;
        }

        if form.description != game_box.description {
            info!(
                "Updated {}'s description {:?} -> {:?}",
                game_box.name, game_box.description, form.description
            );
            game_box.description = form.description.clone();
        }

        let difficulty = bounded("Difficulty", &form.difficulty, BOX_FIELD_MAX)?;
        if difficulty != game_box.difficulty {
            info!(
                "Updated {}'s difficulty {} -> {}",
                game_box.name, game_box.difficulty, difficulty
            );
            game_box.difficulty = difficulty;
        }

        tx.update_box(&game_box).await?;
        tx.commit().await?;
        Ok(game_box)
    }

    /// Move a box to another game level
    pub async fn set_box_level(&self, form: &BoxLevelForm) -> Result<GameBox, ServiceError> {
        let mut tx = self.store.begin().await?;
        let mut game_box = find_box(tx.as_mut(), &form.box_uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Box does not exist"))?;
        let level = match parse_uuid(&form.level_uuid) {
            Some(uuid) => tx.level_by_uuid(uuid).await?,
            None => None,
        }
        .ok_or_else(|| ServiceError::validation("GameLevel does not exist"))?;

        if game_box.game_level_id != level.id {
            info!("Moved {} to game level {}", game_box.name, level.number);
            game_box.game_level_id = level.id;
            tx.update_box(&game_box).await?;
            tx.commit().await?;
        }
        Ok(game_box)
    }

    pub async fn delete_box(&self, form: &UuidForm) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let Some(game_box) = find_box(tx.as_mut(), &form.uuid).await? else {
            warn!("Box ({:?}) does not exist in database", form.uuid);
            return Err(ServiceError::not_found("Box does not exist in database."));
        };
        tx.delete_box(game_box.id).await?;
        tx.commit().await?;

        info!("Deleted box: {}", game_box.name);
        Ok(())
    }

    // -- flags -------------------------------------------------------------

    pub async fn create_flag(
        &self,
        kind: FlagKind,
        form: &NewFlagForm,
    ) -> Result<Flag, ServiceError> {
        let name = check_name("Flag name", &form.flag_name, FLAG_NAME_MAX)?;
        if form.token.is_empty() {
            return Err(ServiceError::validation("Flag token cannot be empty"));
        }
        let value = parse_amount("Reward", &form.reward)?;

        let mut tx = self.store.begin().await?;
        let game_box = find_box(tx.as_mut(), &form.box_uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Box does not exist"))?;
        if flag_named(tx.as_mut(), game_box.id, &name).await?.is_some() {
            return Err(ServiceError::validation(format!(
                "{} already has a flag named {}",
                game_box.name, name
            )));
        }

        let flag = tx
            .create_flag(NewFlag {
                box_id: game_box.id,
                kind,
                name,
                token: form.token.clone(),
                description: form.description.clone(),
                value,
                capture_message: form.capture_message.clone(),
            })
            .await?;
        tx.commit().await?;

        info!(
            "Created {} flag {} on {}",
            kind.as_str(),
            flag.name,
            game_box.name
        );
        Ok(flag)
    }

    pub async fn edit_flag(&self, form: &EditFlagForm) -> Result<Flag, ServiceError> {
        let mut tx = self.store.begin().await?;
        let mut flag = find_flag(tx.as_mut(), &form.uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Flag does not exist"))?;

        let game_box = find_box(tx.as_mut(), &form.box_uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Box does not exist"))?;

        let name = check_name("Flag name", &form.name, FLAG_NAME_MAX)?;
        if name != flag.name || game_box.id != flag.box_id {
            if let Some(other) = flag_named(tx.as_mut(), game_box.id, &name).await? {
                if other.id != flag.id {
                    return Err(ServiceError::validation(format!(
                        "{} already has a flag named {}",
                        game_box.name, name
                    )));
                }
            }
        }
        if name != flag.name {
            info!("Updated flag name {} -> {}", flag.name, name);
            flag.name = name;
        }

        if form.token.is_empty() {
            return Err(ServiceError::validation("Flag token cannot be empty"));
        }
        flag.token = form.token.clone();

        if form.description != flag.description {
            info!(
                "Updated {}'s description {:?} -> {:?}",
                flag.name, flag.description, form.description
            );
            flag.description = form.description.clone();
        }

        flag.value = parse_amount("Value", &form.value)?;
        flag.capture_message = form.capture_message.clone();

        if game_box.id != flag.box_id {
            info!(
                "Updated {}'s box {} -> {}",
                flag.name, flag.box_id, game_box.id
            );
            flag.box_id = game_box.id;
        }

        tx.update_flag(&flag).await?;
        tx.commit().await?;
        Ok(flag)
    }

    pub async fn delete_flag(&self, form: &UuidForm) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let Some(flag) = find_flag(tx.as_mut(), &form.uuid).await? else {
            warn!("Flag ({:?}) does not exist in the database", form.uuid);
            return Err(ServiceError::not_found("Flag does not exist in database."));
        };
        tx.delete_flag(flag.id).await?;
        tx.commit().await?;

        info!("Deleted flag: {}", flag.name);
        Ok(())
    }

    // -- ip addresses ------------------------------------------------------

    /// Attach an IP address to a box
    pub async fn add_ip(&self, form: &IpForm) -> Result<IpAddress, ServiceError> {
        let address = form
            .ip_address
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ServiceError::validation("Invalid IP address"))?
            .to_string();

        let mut tx = self.store.begin().await?;
        let game_box = find_box(tx.as_mut(), &form.box_uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Box does not exist"))?;
        if tx.ip_by_address(&address).await?.is_some() {
            return Err(ServiceError::validation("IP address is already in use"));
        }

        let ip = tx
            .create_ip(NewIpAddress {
                box_id: game_box.id,
                address,
                visible: form.visible.eq_ignore_ascii_case("true"),
            })
            .await?;
        tx.commit().await?;

        info!("Added IP address {} to {}", ip.address, game_box.name);
        Ok(ip)
    }

    pub async fn delete_ip(&self, form: &UuidForm) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let ip = match parse_uuid(&form.uuid) {
            Some(uuid) => tx.ip_by_uuid(uuid).await?,
            None => None,
        };
        let Some(ip) = ip else {
            warn!("IP address ({:?}) does not exist in database", form.uuid);
            return Err(ServiceError::not_found("IP does not exist in database"));
        };
        tx.delete_ip(ip.id).await?;
        tx.commit().await?;

        info!("Deleted IP address: '{}'", ip.address);
        Ok(())
    }

    // -- hints -------------------------------------------------------------

    pub async fn create_hint(&self, form: &NewHintForm) -> Result<Hint, ServiceError> {
        let price = parse_amount("Price", &form.price)?;

        let mut tx = self.store.begin().await?;
        let game_box = find_box(tx.as_mut(), &form.box_uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Box does not exist"))?;
        let hint = tx
            .create_hint(NewHint {
                box_id: game_box.id,
                price,
                description: form.description.clone(),
            })
            .await?;
        tx.commit().await?;

        info!("Created hint {} on {}", hint.uuid, game_box.name);
        Ok(hint)
    }

    pub async fn edit_hint(&self, form: &EditHintForm) -> Result<Hint, ServiceError> {
        let mut tx = self.store.begin().await?;
        let mut hint = find_hint(tx.as_mut(), &form.uuid)
            .await?
            .ok_or_else(|| ServiceError::validation("Hint does not exist"))?;

        tracing::debug!("Edit hint object with uuid of {}", hint.uuid);
        hint.price = parse_amount("Price", &form.price)?;
        hint.description = form.description.clone();

        tx.update_hint(&hint).await?;
        tx.commit().await?;
        Ok(hint)
    }

    pub async fn delete_hint(&self, form: &UuidForm) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let Some(hint) = find_hint(tx.as_mut(), &form.uuid).await? else {
            return Err(ServiceError::not_found("Hint does not exist in database."));
        };
        tx.delete_hint(hint.id).await?;
        tx.commit().await?;

        info!("Delete hint: {}", hint.uuid);
        Ok(())
    }

    // -- market items and teams ---------------------------------------------

    pub async fn edit_market_item(
        &self,
        form: &MarketItemForm,
    ) -> Result<MarketItem, ServiceError> {
        let mut tx = self.store.begin().await?;
        let item = match parse_uuid(&form.item_uuid) {
            Some(uuid) => tx.market_item_by_uuid(uuid).await?,
            None => None,
        };
        let mut item = item.ok_or_else(|| ServiceError::validation("Item does not exist"))?;

        if let Some(raw) = form.price.as_deref() {
            let price = parse_amount("Price", raw)?;
            if price != item.price {
                info!("Updated {}'s price {} -> {}", item.name, item.price, price);
                item.price = price;
                tx.update_market_item(&item).await?;
                tx.commit().await?;
            }
        }
        Ok(item)
    }

    /// Install `DEFAULT_MARKET_ITEMS` when the market is empty; returns how many were added
    pub async fn seed_market(&self) -> Result<usize, ServiceError> {
        let mut tx = self.store.begin().await?;
        if !tx.list_market_items().await?.is_empty() {
            return Ok(0);
        }
        for &(name, price, description) in DEFAULT_MARKET_ITEMS {
            tx.create_market_item(NewMarketItem {
                name: name.to_string(),
                price,
                description: description.to_string(),
            })
            .await?;
        }
        tx.commit().await?;

        info!("Seeded {} market items", DEFAULT_MARKET_ITEMS.len());
        Ok(DEFAULT_MARKET_ITEMS.len())
    }

    pub async fn create_team(&self, form: &NewTeamForm) -> Result<Team, ServiceError> {
        let name = check_name("Team name", &form.team_name, TEAM_NAME_MAX)?;
        let motto = bounded("Motto", &form.motto, TEAM_MOTTO_MAX)?;

        let mut tx = self.store.begin().await?;
        if tx.team_by_name(&name).await?.is_some() {
            return Err(ServiceError::validation("Team already exists"));
        }
        let team = tx.create_team(NewTeam { name, motto }).await?;
        tx.commit().await?;

        info!("Created team {}", team.name);
        Ok(team)
    }

    // -- views -------------------------------------------------------------

    /// Corporations with their boxes, and each box's flags, hints and addresses
    pub async fn game_objects(&self) -> Result<Vec<CorporationView>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let corporations = tx.list_corporations().await?;
        let boxes = tx.list_boxes().await?;
        let flags = tx.list_flags().await?;
        let hints = tx.list_hints().await?;
        let ips = tx.list_ip_addresses().await?;

        Ok(corporations
            .into_iter()
            .map(|corporation| {
                let boxes = boxes
                    .iter()
                    .filter(|b| b.corporation_id == corporation.id)
                    .map(|b| BoxView {
                        game_box: b.clone(),
                        flags: flags.iter().filter(|f| f.box_id == b.id).cloned().collect(),
                        hints: hints.iter().filter(|h| h.box_id == b.id).cloned().collect(),
                        ip_addresses: ips.iter().filter(|i| i.box_id == b.id).cloned().collect(),
                    })
                    .collect();
                CorporationView { corporation, boxes }
            })
            .collect())
    }

    /// Levels head to tail with the boxes unlocked at each
    pub async fn game_levels(&self) -> Result<Vec<LevelView>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let levels = in_sequence(tx.list_levels().await?);
        let boxes = tx.list_boxes().await?;

        Ok(levels
            .into_iter()
            .map(|level| LevelView {
                boxes: boxes
                    .iter()
                    .filter(|b| b.game_level_id == level.id)
                    .cloned()
                    .collect(),
                level,
            })
            .collect())
    }

    pub async fn market_objects(&self) -> Result<Vec<MarketItem>, ServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_market_items().await?)
    }

    pub async fn teams(&self) -> Result<Vec<Team>, ServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_teams().await?)
    }

    /// One object as JSON, or `None` when the uuid does not resolve
    pub async fn object_data(
        &self,
        kind: ObjectKind,
        uuid: &str,
    ) -> Result<Option<Value>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let tx = tx.as_mut();
        let value = match kind {
            ObjectKind::GameLevel => match parse_uuid(uuid) {
                Some(uuid) => to_json(tx.level_by_uuid(uuid).await?),
                None => None,
            },
            ObjectKind::Corporation => to_json(find_corporation(tx, uuid).await?),
            ObjectKind::Flag => to_json(find_flag(tx, uuid).await?),
            ObjectKind::Box => to_json(find_box(tx, uuid).await?),
            ObjectKind::Hint => to_json(find_hint(tx, uuid).await?),
        };
        Ok(value)
    }
}

fn to_json<T: Serialize>(record: Option<T>) -> Option<Value> {
    record.and_then(|record| serde_json::to_value(record).ok())
}

/// Trimmed and at most `max` characters; may be empty
fn bounded(field: &str, raw: &str, max: usize) -> Result<String, ServiceError> {
    let value = raw.trim();
    if value.chars().count() > max {
        return Err(ServiceError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

async fn find_corporation(
    tx: &mut dyn StoreTx,
    raw: &str,
) -> Result<Option<Corporation>, DatabaseError> {
    match parse_uuid(raw) {
        Some(uuid) => tx.corporation_by_uuid(uuid).await,
        None => Ok(None),
    }
}

async fn find_box(tx: &mut dyn StoreTx, raw: &str) -> Result<Option<GameBox>, DatabaseError> {
    match parse_uuid(raw) {
        Some(uuid) => tx.box_by_uuid(uuid).await,
        None => Ok(None),
    }
}

async fn find_flag(tx: &mut dyn StoreTx, raw: &str) -> Result<Option<Flag>, DatabaseError> {
    match parse_uuid(raw) {
        Some(uuid) => tx.flag_by_uuid(uuid).await,
        None => Ok(None),
    }
}

async fn find_hint(tx: &mut dyn StoreTx, raw: &str) -> Result<Option<Hint>, DatabaseError> {
    match parse_uuid(raw) {
        Some(uuid) => tx.hint_by_uuid(uuid).await,
        None => Ok(None),
    }
}

async fn flag_named(
    tx: &mut dyn StoreTx,
    box_id: i32,
    name: &str,
) -> Result<Option<Flag>, DatabaseError> {
    Ok(tx
        .list_flags()
        .await?
        .into_iter()
        .find(|flag| flag.box_id == box_id && flag.name == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewMarketItem;
    use crate::testing::TestContext;
    use uuid::Uuid;

    fn box_form(ctx: &TestContext, name: &str) -> NewBoxForm {
        NewBoxForm {
            name: name.into(),
            corporation_uuid: ctx.corporation.uuid.to_string(),
            game_level: "0".into(),
            description: "A web server".into(),
            difficulty: "easy".into(),
            operating_system: Some("linux".into()),
            autoformat: "true".into(),
        }
    }

    fn flag_form(box_uuid: Uuid, name: &str) -> NewFlagForm {
        NewFlagForm {
            box_uuid: box_uuid.to_string(),
            flag_name: name.into(),
            token: "FLAG{root}".into(),
            description: "Get root".into(),
            reward: "100".into(),
            capture_message: "Nice".into(),
        }
    }

    #[tokio::test]
    async fn corporation_names_are_unique() {
        let ctx = TestContext::new().await;
        let err = ctx
            .admin
            .create_corporation(&NewCorporationForm {
                corporation_name: ctx.corporation.name.clone(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Corporation name already exists");
    }

    #[tokio::test]
    async fn corporation_rename_and_delete() {
        let ctx = TestContext::new().await;
        let uuid = ctx.corporation.uuid.to_string();

        let renamed = ctx
            .admin
            .edit_corporation(&EditCorporationForm {
                uuid: uuid.clone(),
                name: "Globex".into(),
            })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Globex");

        ctx.admin
            .delete_corporation(&UuidForm { uuid: uuid.clone() })
            .await
            .unwrap();
        let err = ctx
            .admin
            .delete_corporation(&UuidForm { uuid })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn box_creation_checks_references() {
        let ctx = TestContext::new().await;

        let game_box = ctx.admin.create_box(&box_form(&ctx, "web01")).await.unwrap();
        assert_eq!(game_box.game_level_id, ctx.head.id);
        assert!(game_box.autoformat);
        assert_eq!(game_box.operating_system, "linux");

        let err = ctx.admin.create_box(&box_form(&ctx, "web01")).await.unwrap_err();
        assert_eq!(err.to_string(), "Box name already exists");

        let mut form = box_form(&ctx, "web02");
        form.corporation_uuid = Uuid::new_v4().to_string();
        let err = ctx.admin.create_box(&form).await.unwrap_err();
        assert_eq!(err.to_string(), "Corporation does not exist");

        let mut form = box_form(&ctx, "web02");
        form.game_level = "42".into();
        let err = ctx.admin.create_box(&form).await.unwrap_err();
        assert_eq!(err.to_string(), "Game level does not exist");

        let mut form = box_form(&ctx, "web02");
        form.operating_system = None;
        form.autoformat = "yes".into();
        let game_box = ctx.admin.create_box(&form).await.unwrap();
        assert_eq!(game_box.operating_system, "?");
        assert!(!game_box.autoformat);
    }

    #[tokio::test]
    async fn box_edit_updates_fields() {
        let ctx = TestContext::new().await;
        let game_box = ctx.admin.create_box(&box_form(&ctx, "web01")).await.unwrap();
        ctx.admin.create_box(&box_form(&ctx, "db01")).await.unwrap();

        let mut form = EditBoxForm {
            uuid: game_box.uuid.to_string(),
            name: "db01".into(),
            corporation_uuid: ctx.corporation.uuid.to_string(),
            description: "changed".into(),
            difficulty: "hard".into(),
        };
        let err = ctx.admin.edit_box(&form).await.unwrap_err();
        assert_eq!(err.to_string(), "Box name already exists");

        form.name = "web99".into();
        let edited = ctx.admin.edit_box(&form).await.unwrap();
        assert_eq!(edited.name, "web99");
        assert_eq!(edited.description, "changed");
        assert_eq!(edited.difficulty, "hard");

        form.corporation_uuid = String::new();
        let err = ctx.admin.edit_box(&form).await.unwrap_err();
        assert_eq!(err.to_string(), "Corporation does not exist");
    }

    #[tokio::test]
    async fn boxes_move_between_levels() {
        let ctx = TestContext::new().await;
        let next = ctx.levels.insert("1", "500").await.unwrap();
        let game_box = ctx.admin.create_box(&box_form(&ctx, "web01")).await.unwrap();

        let moved = ctx
            .admin
            .set_box_level(&BoxLevelForm {
                box_uuid: game_box.uuid.to_string(),
                level_uuid: next.uuid.to_string(),
            })
            .await
            .unwrap();
        assert_eq!(moved.game_level_id, next.id);

        let err = ctx
            .admin
            .set_box_level(&BoxLevelForm {
                box_uuid: game_box.uuid.to_string(),
                level_uuid: Uuid::new_v4().to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "GameLevel does not exist");

        // The head is empty now, so it can go; the other level becomes the head
        ctx.levels.delete(&ctx.head.uuid.to_string()).await.unwrap();
        let levels = ctx.admin.game_levels().await.unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].level.number, 0);
        assert_eq!(levels[0].boxes.len(), 1);
    }

    #[tokio::test]
    async fn flags_are_created_edited_and_deleted() {
        let ctx = TestContext::new().await;
        let web = ctx.admin.create_box(&box_form(&ctx, "web01")).await.unwrap();
        let db = ctx.admin.create_box(&box_form(&ctx, "db01")).await.unwrap();

        let flag = ctx
            .admin
            .create_flag(FlagKind::Static, &flag_form(web.uuid, "root"))
            .await
            .unwrap();
        assert_eq!(flag.flag_type, "static");
        assert_eq!(flag.value, 100);

        let err = ctx
            .admin
            .create_flag(FlagKind::Regex, &flag_form(web.uuid, "root"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut bad_reward = flag_form(web.uuid, "user");
        bad_reward.reward = "lots".into();
        assert!(ctx
            .admin
            .create_flag(FlagKind::Static, &bad_reward)
            .await
            .is_err());

        let edited = ctx
            .admin
            .edit_flag(&EditFlagForm {
                uuid: flag.uuid.to_string(),
                name: "root-shell".into(),
                token: "FLAG{new}".into(),
                description: "Get a root shell".into(),
                value: "250".into(),
                capture_message: "Well done".into(),
                box_uuid: db.uuid.to_string(),
            })
            .await
            .unwrap();
        assert_eq!(edited.box_id, db.id);
        assert_eq!(edited.value, 250);
        assert_eq!(edited.token, "FLAG{new}");

        ctx.admin
            .delete_flag(&UuidForm {
                uuid: flag.uuid.to_string(),
            })
            .await
            .unwrap();
        let err = ctx
            .admin
            .delete_flag(&UuidForm {
                uuid: flag.uuid.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Flag does not exist in database.");
    }

    #[tokio::test]
    async fn ip_addresses_are_unique_and_canonical() {
        let ctx = TestContext::new().await;
        let web = ctx.admin.create_box(&box_form(&ctx, "web01")).await.unwrap();

        let ip = ctx
            .admin
            .add_ip(&IpForm {
                box_uuid: web.uuid.to_string(),
                ip_address: " 2001:DB8::1 ".into(),
                visible: "TRUE".into(),
            })
            .await
            .unwrap();
        assert_eq!(ip.address, "2001:db8::1");
        assert!(ip.visible);

        let err = ctx
            .admin
            .add_ip(&IpForm {
                box_uuid: web.uuid.to_string(),
                ip_address: "2001:db8::1".into(),
                visible: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "IP address is already in use");

        let err = ctx
            .admin
            .add_ip(&IpForm {
                box_uuid: web.uuid.to_string(),
                ip_address: "10.0.0.300".into(),
                visible: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid IP address");

        let hidden = ctx
            .admin
            .add_ip(&IpForm {
                box_uuid: web.uuid.to_string(),
                ip_address: "10.0.0.3".into(),
                visible: "false".into(),
            })
            .await
            .unwrap();
        assert!(!hidden.visible);

        ctx.admin
            .delete_ip(&UuidForm {
                uuid: ip.uuid.to_string(),
            })
            .await
            .unwrap();
        let objects = ctx.admin.game_objects().await.unwrap();
        assert_eq!(objects[0].boxes[0].ip_addresses, vec![hidden]);
    }

    #[tokio::test]
    async fn hints_follow_their_box() {
        let ctx = TestContext::new().await;
        let web = ctx.admin.create_box(&box_form(&ctx, "web01")).await.unwrap();

        let hint = ctx
            .admin
            .create_hint(&NewHintForm {
                box_uuid: web.uuid.to_string(),
                price: "10".into(),
                description: "Check robots.txt".into(),
            })
            .await
            .unwrap();

        let edited = ctx
            .admin
            .edit_hint(&EditHintForm {
                uuid: hint.uuid.to_string(),
                price: "20".into(),
                description: "Really, check robots.txt".into(),
            })
            .await
            .unwrap();
        assert_eq!(edited.price, 20);

        ctx.admin
            .delete_box(&UuidForm {
                uuid: web.uuid.to_string(),
            })
            .await
            .unwrap();
        let err = ctx
            .admin
            .delete_hint(&UuidForm {
                uuid: hint.uuid.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn market_item_price_changes() {
        let ctx = TestContext::new().await;
        let item = ctx
            .seed_market_item(NewMarketItem {
                name: "Source Code Market".into(),
                price: 5000,
                description: "Buy leaked source".into(),
            })
            .await;

        let unchanged = ctx
            .admin
            .edit_market_item(&MarketItemForm {
                item_uuid: item.uuid.to_string(),
                price: None,
            })
            .await
            .unwrap();
        assert_eq!(unchanged.price, 5000);

        let updated = ctx
            .admin
            .edit_market_item(&MarketItemForm {
                item_uuid: item.uuid.to_string(),
                price: Some("7500".into()),
            })
            .await
            .unwrap();
        assert_eq!(updated.price, 7500);
        assert_eq!(ctx.admin.market_objects().await.unwrap()[0].price, 7500);

        let err = ctx
            .admin
            .edit_market_item(&MarketItemForm {
                item_uuid: Uuid::new_v4().to_string(),
                price: Some("1".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Item does not exist");
    }

    #[tokio::test]
    async fn market_is_seeded_once() {
        let ctx = TestContext::new().await;
        assert_eq!(ctx.admin.seed_market().await.unwrap(), DEFAULT_MARKET_ITEMS.len());
        assert_eq!(ctx.admin.seed_market().await.unwrap(), 0);

        let items = ctx.admin.market_objects().await.unwrap();
        assert_eq!(items.len(), DEFAULT_MARKET_ITEMS.len());

        let updated = ctx
            .admin
            .edit_market_item(&MarketItemForm {
                item_uuid: items[0].uuid.to_string(),
                price: Some("1234".into()),
            })
            .await
            .unwrap();
        assert_eq!(updated.price, 1234);
    }

    #[tokio::test]
    async fn team_names_are_unique() {
        let ctx = TestContext::new().await;
        let form = NewTeamForm {
            team_name: "Red".into(),
            motto: "We hack".into(),
        };
        ctx.admin.create_team(&form).await.unwrap();
        let err = ctx.admin.create_team(&form).await.unwrap_err();
        assert_eq!(err.to_string(), "Team already exists");
        assert_eq!(ctx.admin.teams().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn object_data_describes_records() {
        let ctx = TestContext::new().await;

        let level = ctx
            .admin
            .object_data(ObjectKind::GameLevel, &ctx.head.uuid.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(level["number"], 0);

        let corp = ctx
            .admin
            .object_data(ObjectKind::Corporation, &ctx.corporation.uuid.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(corp["name"], ctx.corporation.name.as_str());

        let missing = ctx
            .admin
            .object_data(ObjectKind::Box, &Uuid::new_v4().to_string())
            .await
            .unwrap();
        assert!(missing.is_none());

        assert_eq!("hint".parse::<ObjectKind>(), Ok(ObjectKind::Hint));
        assert!("team".parse::<ObjectKind>().is_err());
    }
}
