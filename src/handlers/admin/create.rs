// handlers/admin/create.rs - POST /admin/create/* handlers
use axum::{extract::State, response::Redirect, Form};

use super::{NewLevelForm, GAME_LEVELS, GAME_OBJECTS, TEAMS};
use crate::app::AppState;
use crate::database::models::FlagKind;
use crate::error::ApiError;
use crate::services::game_objects::{
    NewBoxForm, NewCorporationForm, NewFlagForm, NewHintForm, NewTeamForm,
};

/// POST /admin/create/corporation
pub async fn corporation(
    State(state): State<AppState>,
    Form(form): Form<NewCorporationForm>,
) -> Result<Redirect, ApiError> {
    state.admin.create_corporation(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/create/box
pub async fn game_box(
    State(state): State<AppState>,
    Form(form): Form<NewBoxForm>,
) -> Result<Redirect, ApiError> {
    state.admin.create_box(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/create/flag/static
pub async fn static_flag(
    State(state): State<AppState>,
    Form(form): Form<NewFlagForm>,
) -> Result<Redirect, ApiError> {
    state.admin.create_flag(FlagKind::Static, &form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/create/flag/regex
///
/// The token is stored as entered; patterns are not compiled here.
pub async fn regex_flag(
    State(state): State<AppState>,
    Form(form): Form<NewFlagForm>,
) -> Result<Redirect, ApiError> {
    state.admin.create_flag(FlagKind::Regex, &form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/create/game_level
pub async fn game_level(
    State(state): State<AppState>,
    Form(form): Form<NewLevelForm>,
) -> Result<Redirect, ApiError> {
    state
        .levels
        .insert(&form.level_number, &form.buyout)
        .await?;
    Ok(Redirect::to(GAME_LEVELS))
}

/// POST /admin/create/hint
pub async fn hint(
    State(state): State<AppState>,
    Form(form): Form<NewHintForm>,
) -> Result<Redirect, ApiError> {
    state.admin.create_hint(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/create/team
pub async fn team(
    State(state): State<AppState>,
    Form(form): Form<NewTeamForm>,
) -> Result<Redirect, ApiError> {
    state.admin.create_team(&form).await?;
    Ok(Redirect::to(TEAMS))
}
