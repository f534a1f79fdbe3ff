use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::models::Plan;
use crate::payments;
use crate::provisioning::ProvisioningService;

#[derive(Debug, Deserialize)]
pub struct CompleteSignupRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompleteSignupResponse {
    pub success: bool,
    pub user_id: String,
    pub email: String,
    #[serde(rename = "selectedPlan")]
    pub selected_plan: String,
    /// Session token from identity creation, so the caller lands in the
    /// dashboard without a separate login step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Finish a signup after the hosted checkout: verify the session, recover
/// the snapshot from its metadata, and provision the account.
///
/// Replays (browser reload of the return URL) re-verify harmlessly and then
/// stop at identity creation with an account-exists conflict - the identity
/// provider's email uniqueness is the only replay guard.
pub async fn complete_signup(
    State(state): State<AppState>,
    Json(request): Json<CompleteSignupRequest>,
) -> Result<Json<CompleteSignupResponse>> {
    let session_id = request
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_SESSION_ID.into()))?;

    let verified = payments::verify_session(state.payments.as_ref(), &session_id).await?;

    if !verified.paid {
        return Err(AppError::BadRequest(msg::PAYMENT_NOT_COMPLETED.into()));
    }

    // Paid but unrecoverable metadata is its own failure mode: the money
    // moved, so this must read as "contact support", not "try again".
    let snapshot = verified
        .form_data
        .ok_or_else(|| AppError::Provider(msg::FORM_DATA_UNRECOVERABLE.into()))?;

    let plan = verified
        .selected_plan
        .as_deref()
        .and_then(Plan::parse)
        .ok_or_else(|| AppError::Provider(msg::FORM_DATA_UNRECOVERABLE.into()))?;

    let account = ProvisioningService::from_state(&state)
        .provision(&snapshot, plan)
        .await?;

    Ok(Json(CompleteSignupResponse {
        success: true,
        user_id: account.user.id,
        email: account.user.email,
        selected_plan: account.profile.selected_plan,
        access_token: account.access_token,
    }))
}
