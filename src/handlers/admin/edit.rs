// handlers/admin/edit.rs - GET|POST /admin/edit/* handlers
//
// GET on an edit page lands on the view that lists the object.
use axum::{extract::State, response::Redirect, Form};

use super::{EditLevelForm, GAME_LEVELS, GAME_OBJECTS, MARKET_OBJECTS};
use crate::app::AppState;
use crate::error::ApiError;
use crate::services::game_objects::{
    BoxLevelForm, EditBoxForm, EditCorporationForm, EditFlagForm, EditHintForm, IpForm,
    MarketItemForm,
};

pub async fn show_game_objects() -> Redirect {
    Redirect::to(GAME_OBJECTS)
}

pub async fn show_game_levels() -> Redirect {
    Redirect::to(GAME_LEVELS)
}

pub async fn show_market_objects() -> Redirect {
    Redirect::to(MARKET_OBJECTS)
}

/// POST /admin/edit/corporation
pub async fn corporation(
    State(state): State<AppState>,
    Form(form): Form<EditCorporationForm>,
) -> Result<Redirect, ApiError> {
    state.admin.edit_corporation(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/edit/box
pub async fn game_box(
    State(state): State<AppState>,
    Form(form): Form<EditBoxForm>,
) -> Result<Redirect, ApiError> {
    state.admin.edit_box(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/edit/flag
pub async fn flag(
    State(state): State<AppState>,
    Form(form): Form<EditFlagForm>,
) -> Result<Redirect, ApiError> {
    state.admin.edit_flag(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/edit/ip - Adds an address to a box
pub async fn ip(
    State(state): State<AppState>,
    Form(form): Form<IpForm>,
) -> Result<Redirect, ApiError> {
    state.admin.add_ip(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/edit/game_level - Renumber a level and re-link the sequence
pub async fn game_level(
    State(state): State<AppState>,
    Form(form): Form<EditLevelForm>,
) -> Result<Redirect, ApiError> {
    state
        .levels
        .renumber(&form.uuid, form.number.as_deref(), form.buyout.as_deref())
        .await?;
    Ok(Redirect::to(GAME_LEVELS))
}

/// POST /admin/edit/box_level
pub async fn box_level(
    State(state): State<AppState>,
    Form(form): Form<BoxLevelForm>,
) -> Result<Redirect, ApiError> {
    state.admin.set_box_level(&form).await?;
    Ok(Redirect::to(GAME_LEVELS))
}

/// POST /admin/edit/hint
pub async fn hint(
    State(state): State<AppState>,
    Form(form): Form<EditHintForm>,
) -> Result<Redirect, ApiError> {
    state.admin.edit_hint(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/edit/market_item
pub async fn market_item(
    State(state): State<AppState>,
    Form(form): Form<MarketItemForm>,
) -> Result<Redirect, ApiError> {
    state.admin.edit_market_item(&form).await?;
    Ok(Redirect::to(MARKET_OBJECTS))
}
