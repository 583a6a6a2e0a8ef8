// handlers/admin/mod.rs - Admin panel form handlers
//
// Mutations answer 303 See Other to the view listing the object; failures
// answer the ApiError JSON body.

use serde::Deserialize;

pub mod ajax; // POST /admin/ajax/objects
pub mod create; // POST /admin/create/*
pub mod delete; // POST /admin/delete/*
pub mod edit; // GET|POST /admin/edit/*
pub mod view; // GET /admin/view/*

pub(crate) const GAME_OBJECTS: &str = "/admin/view/game_objects";
pub(crate) const GAME_LEVELS: &str = "/admin/view/game_levels";
pub(crate) const MARKET_OBJECTS: &str = "/admin/view/market_objects";
pub(crate) const TEAMS: &str = "/admin/view/teams";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewLevelForm {
    pub level_number: String,
    pub buyout: String,
}

/// Absent fields are `None`: a blank number keeps the current one, a missing
/// buyout falls back to the default
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditLevelForm {
    pub uuid: String,
    pub number: Option<String>,
    pub buyout: Option<String>,
}
