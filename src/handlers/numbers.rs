use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::models::Profile;
use crate::util::clean_automation_field;

fn payload_str(payload: &serde_json::Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[derive(Debug, Serialize)]
pub struct BuyNumberResponse {
    pub success: bool,
    pub message: String,
    pub data: serde_json::Value,
}

/// Relay a number-purchase intent to the workflow engine.
///
/// The payload is forwarded verbatim (the workflow picks its own fields);
/// only `user_id` and `email` are required here. Provisioning is
/// asynchronous - the engine calls back on /numbers/callback - but some
/// workflows answer synchronously with the number, in which case it is
/// saved immediately and the callback write becomes a no-op repeat.
pub async fn buy_number(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<BuyNumberResponse>> {
    let user_id = payload_str(&payload, "user_id");
    let email = payload_str(&payload, "email");
    let (user_id, _email) = match (user_id, email) {
        (Some(u), Some(e)) => (u, e),
        _ => return Err(AppError::BadRequest(msg::MISSING_USER_OR_EMAIL.into())),
    };

    let ack = state.workflow.trigger_number_purchase(&payload).await?;

    if let Some(number) = ack.phone_number() {
        let number = clean_automation_field(Some(number));
        let conn = state.db.get()?;
        match queries::set_agent_number(&conn, &user_id, &number) {
            Ok(Some(_)) => {
                tracing::info!(user_id = %user_id, "Saved synchronously provisioned number");
            }
            Ok(None) => {
                tracing::warn!(user_id = %user_id, "Workflow ack referenced unknown user");
            }
            Err(e) => {
                // The async callback will retry this write; don't fail the
                // purchase acknowledgment over it.
                tracing::warn!(user_id = %user_id, "Failed to save acked number: {}", e);
            }
        }
    }

    Ok(Json(BuyNumberResponse {
        success: true,
        message: "Number purchase request submitted successfully".to_string(),
        data: ack.body,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SaveNumberRequest {
    #[serde(default, rename = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, rename = "friendlyName")]
    pub friendly_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedNumber {
    pub user_id: String,
    pub agent_number: String,
    pub friendly_name: String,
    pub updated_profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct SaveNumberResponse {
    pub success: bool,
    pub message: String,
    pub data: SavedNumber,
}

/// Inbound callback from the workflow engine with a purchased number.
///
/// The engine's expression nodes sometimes prefix values with a literal
/// `=`; every field is cleaned before use. An unknown user id is a distinct
/// 404 (stale or malformed workflow data), never an implicit insert.
pub async fn save_agent_number(
    State(state): State<AppState>,
    Json(request): Json<SaveNumberRequest>,
) -> Result<Json<SaveNumberResponse>> {
    let phone_number = clean_automation_field(request.phone_number.as_deref());
    let user_id = clean_automation_field(request.user_id.as_deref());
    let friendly_name = clean_automation_field(request.friendly_name.as_deref());

    if phone_number.is_empty() || user_id.is_empty() {
        return Err(AppError::BadRequest(msg::MISSING_NUMBER_FIELDS.into()));
    }

    let conn = state.db.get()?;

    // Existence check first so a stale workflow id is loggable and distinct
    // from a store failure.
    let existing = queries::get_profile_by_id(&conn, &user_id)?;
    if existing.is_none() {
        tracing::warn!(user_id = %user_id, "Number callback for unknown user");
        return Err(AppError::NotFound(msg::USER_NOT_FOUND.into()));
    }

    let updated = queries::set_agent_number(&conn, &user_id, &phone_number)?
        .ok_or_else(|| AppError::Internal("Profile update returned no row".into()))?;

    tracing::info!(user_id = %user_id, number = %phone_number, "Saved agent number");

    Ok(Json(SaveNumberResponse {
        success: true,
        message: "Agent number saved successfully".to_string(),
        data: SavedNumber {
            user_id,
            agent_number: phone_number,
            friendly_name,
            updated_profile: updated,
        },
    }))
}
