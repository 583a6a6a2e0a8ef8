// handlers/admin/delete.rs - POST /admin/delete/* handlers
use axum::{extract::State, response::Redirect, Form};

use super::{GAME_LEVELS, GAME_OBJECTS};
use crate::app::AppState;
use crate::error::ApiError;
use crate::services::game_objects::UuidForm;

/// POST /admin/delete/ip
pub async fn ip(
    State(state): State<AppState>,
    Form(form): Form<UuidForm>,
) -> Result<Redirect, ApiError> {
    state.admin.delete_ip(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/delete/flag
pub async fn flag(
    State(state): State<AppState>,
    Form(form): Form<UuidForm>,
) -> Result<Redirect, ApiError> {
    state.admin.delete_flag(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/delete/hint
pub async fn hint(
    State(state): State<AppState>,
    Form(form): Form<UuidForm>,
) -> Result<Redirect, ApiError> {
    state.admin.delete_hint(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/delete/box - Also removes the box's flags, hints and IPs
pub async fn game_box(
    State(state): State<AppState>,
    Form(form): Form<UuidForm>,
) -> Result<Redirect, ApiError> {
    state.admin.delete_box(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/delete/corporation - Also removes the corporation's boxes
pub async fn corporation(
    State(state): State<AppState>,
    Form(form): Form<UuidForm>,
) -> Result<Redirect, ApiError> {
    state.admin.delete_corporation(&form).await?;
    Ok(Redirect::to(GAME_OBJECTS))
}

/// POST /admin/delete/game_level - Refused while boxes are assigned to the level
pub async fn game_level(
    State(state): State<AppState>,
    Form(form): Form<UuidForm>,
) -> Result<Redirect, ApiError> {
    state.levels.delete(&form.uuid).await?;
    Ok(Redirect::to(GAME_LEVELS))
}
