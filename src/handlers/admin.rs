use axum::extract::State;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::models::{NewProfile, Profile, Role};

/// Constant-time secret comparison so response timing leaks nothing about
/// the expected value. Length is checked first; secret length is not
/// sensitive.
fn check_secret(expected: &str, provided: Option<&str>) -> Result<()> {
    let provided = provided.unwrap_or("");
    if expected.len() != provided.len() {
        return Err(AppError::Unauthorized);
    }
    if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminAccountResponse {
    pub success: bool,
    pub message: String,
    pub user: AdminUser,
}

/// Provision a super-admin account outside the payment flow.
///
/// Guarded by a shared secret instead of payment verification; the profile
/// is marked payment-exempt. Idempotent on the identity side: an existing
/// identity for the email is reused, an existing profile is promoted and
/// re-linked rather than duplicated.
pub async fn create_admin_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAdminRequest>,
) -> Result<Json<AdminAccountResponse>> {
    check_secret(&state.super_admin_secret, request.secret.as_deref())?;

    let (email, password) = match (request.email, request.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => return Err(AppError::BadRequest(msg::MISSING_CREDENTIALS.into())),
    };

    let identity = match state.identity.find_user_by_email(&email).await? {
        Some(existing) => {
            tracing::info!(email = %email, "Reusing existing identity for admin account");
            existing
        }
        None => state.identity.admin_create_user(&email, &password).await?,
    };

    let conn = state.db.get()?;
    let profile = match queries::get_profile_by_email(&conn, &email)? {
        Some(_) => queries::adopt_super_admin(&conn, &email, &identity.id)?
            .ok_or_else(|| AppError::Internal("Profile promotion returned no row".into()))?,
        None => queries::create_profile(&conn, &NewProfile::super_admin(&identity.id, &email))?,
    };

    Ok(Json(AdminAccountResponse {
        success: true,
        message: "Super admin account created/updated successfully".to_string(),
        user: AdminUser {
            id: profile.id,
            email: profile.email,
            role: profile.role,
            created_at: profile.created_at,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    pub success: bool,
    pub message: String,
    pub user: Profile,
}

/// Promote an existing user to super admin by email.
pub async fn promote_super_admin(
    State(state): State<AppState>,
    Json(request): Json<PromoteRequest>,
) -> Result<Json<PromoteResponse>> {
    check_secret(&state.super_admin_secret, request.secret.as_deref())?;

    let email = request
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_EMAIL.into()))?;

    let conn = state.db.get()?;
    let profile =
        queries::promote_to_super_admin(&conn, &email)?.or_not_found(msg::USER_NOT_FOUND)?;

    Ok(Json(PromoteResponse {
        success: true,
        message: format!("User {} has been set as super admin", email),
        user: profile,
    }))
}
