use std::collections::HashMap;

use axum::extract::State;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::models::{Plan, SignupSnapshot};
use crate::payments::{self, CreateCheckout, METADATA_FORM_DATA, METADATA_SELECTED_PLAN};
use crate::util::site_url_from_headers;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default, rename = "formData")]
    pub form_data: Option<SignupSnapshot>,
    #[serde(default, rename = "selectedPlan")]
    pub selected_plan: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub url: String,
}

/// Create a hosted checkout session for a signup form submission.
///
/// The entire snapshot rides along as session metadata - nothing is written
/// locally until payment is verified. The success URL carries the provider's
/// session-id placeholder, substituted when the user returns.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>> {
    let (snapshot, plan_id) = match (request.form_data, request.selected_plan) {
        (Some(snapshot), Some(plan)) if !plan.is_empty() => (snapshot, plan),
        _ => return Err(AppError::BadRequest(msg::MISSING_FORM_DATA.into())),
    };

    let plan = Plan::parse(&plan_id).ok_or_else(|| AppError::BadRequest(msg::INVALID_PLAN.into()))?;

    let site_url = site_url_from_headers(&headers, &state.site_url);

    let mut metadata = HashMap::new();
    metadata.insert(
        METADATA_FORM_DATA.to_string(),
        serde_json::to_string(&snapshot)?,
    );
    metadata.insert(METADATA_SELECTED_PLAN.to_string(), plan.as_str().to_string());

    let session = state
        .payments
        .create_checkout_session(&CreateCheckout {
            amount_cents: plan.amount_cents(),
            product_name: format!("Crewline {} Plan", plan.display_name()),
            product_description: plan.checkout_description().to_string(),
            customer_email: snapshot.email.clone(),
            success_url: format!("{}/signup?session_id={{CHECKOUT_SESSION_ID}}", site_url),
            cancel_url: format!("{}/signup?payment=cancelled", site_url),
            metadata,
        })
        .await?;

    let url = session
        .url
        .ok_or_else(|| AppError::Provider("No checkout URL returned".into()))?;

    Ok(Json(CreateSessionResponse {
        session_id: session.id,
        url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub paid: bool,
    #[serde(rename = "formData")]
    pub form_data: Option<SignupSnapshot>,
    #[serde(rename = "selectedPlan")]
    pub selected_plan: Option<String>,
    pub customer_email: Option<String>,
    pub amount_total: Option<i64>,
}

/// Verify a checkout session after the browser returns from the hosted page.
///
/// Idempotent read: reloads of the return URL replay this harmlessly.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let session_id = request
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_SESSION_ID.into()))?;

    let verified = payments::verify_session(state.payments.as_ref(), &session_id).await?;

    Ok(Json(VerifyPaymentResponse {
        paid: verified.paid,
        form_data: verified.form_data,
        selected_plan: verified.selected_plan,
        customer_email: verified.customer_email,
        amount_total: verified.amount_total,
    }))
}
