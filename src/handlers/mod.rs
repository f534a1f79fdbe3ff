mod admin;
mod checkout;
mod numbers;
mod profile;
mod signup;

pub use admin::*;
pub use checkout::*;
pub use numbers::*;
pub use profile::*;
pub use signup::*;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Signup + payment flow
        .route("/checkout/session", post(create_checkout_session))
        .route("/checkout/verify", post(verify_payment))
        .route("/signup/complete", post(complete_signup))
        // Number provisioning: outbound relay + inbound workflow callback
        .route("/numbers/buy", post(buy_number))
        .route("/numbers/callback", post(save_agent_number))
        // Profiles
        .route("/profile/{id}", get(get_profile).put(update_profile))
        // Privileged, secret-guarded surface
        .route("/admin/accounts", post(create_admin_account))
        .route("/admin/promote", post(promote_super_admin))
}
