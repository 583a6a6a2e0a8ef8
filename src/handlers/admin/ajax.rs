// handlers/admin/ajax.rs - POST /admin/ajax/objects handler
use axum::{extract::State, response::Json, Form};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::game_objects::ObjectKind;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ObjectQuery {
    pub obj: String,
    pub uuid: String,
}

/// POST /admin/ajax/objects - One game object as JSON for the edit dialogs
///
/// Unknown types and uuids answer 200 with an `Error` key, which is what the
/// panel's scripts check for.
pub async fn objects(
    State(state): State<AppState>,
    Form(query): Form<ObjectQuery>,
) -> Result<Json<Value>, ApiError> {
    let Ok(kind) = query.obj.parse::<ObjectKind>() else {
        return Ok(Json(json!({ "Error": "Invalid object type." })));
    };
    match state.admin.object_data(kind, &query.uuid).await? {
        Some(value) => Ok(Json(value)),
        None => Ok(Json(json!({ "Error": "Invalid uuid." }))),
    }
}
