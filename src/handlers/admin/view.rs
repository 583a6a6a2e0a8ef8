// handlers/admin/view.rs - GET /admin/view/* handlers
use axum::extract::State;

use crate::app::AppState;
use crate::database::models::{MarketItem, Team};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::game_objects::{CorporationView, LevelView};

/// GET /admin/view/game_objects - Corporations with their boxes, flags, hints and IPs
pub async fn game_objects(State(state): State<AppState>) -> ApiResult<Vec<CorporationView>> {
    Ok(ApiResponse::success(state.admin.game_objects().await?))
}

/// GET /admin/view/game_levels - Levels from the head down, with their boxes
pub async fn game_levels(State(state): State<AppState>) -> ApiResult<Vec<LevelView>> {
    Ok(ApiResponse::success(state.admin.game_levels().await?))
}

/// GET /admin/view/market_objects
pub async fn market_objects(State(state): State<AppState>) -> ApiResult<Vec<MarketItem>> {
    Ok(ApiResponse::success(state.admin.market_objects().await?))
}

/// GET /admin/view/teams
pub async fn teams(State(state): State<AppState>) -> ApiResult<Vec<Team>> {
    Ok(ApiResponse::success(state.admin.teams().await?))
}
