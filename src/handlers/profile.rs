use axum::extract::State;

use crate::db::{queries, AppState};
use crate::error::{msg, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::models::{Profile, UpdateProfile};

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Profile>> {
    let conn = state.db.get()?;
    let profile = queries::get_profile_by_id(&conn, &id)?.or_not_found(msg::PROFILE_NOT_FOUND)?;
    Ok(Json(profile))
}

/// Partial update of the user-editable profile fields. Role, payment
/// status, and the number pair have their own paths and are not reachable
/// from here.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateProfile>,
) -> Result<Json<Profile>> {
    let conn = state.db.get()?;
    let profile =
        queries::update_profile(&conn, &id, &input)?.or_not_found(msg::PROFILE_NOT_FOUND)?;
    Ok(Json(profile))
}
