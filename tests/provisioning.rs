//! Tests for deferred account provisioning: POST /signup/complete and the
//! provisioning service's step ordering guarantees.

use axum::{body::Body, http::Request};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::*;

async fn complete(state: AppState, body: serde_json::Value) -> axum::response::Response {
    app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signup/complete")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn unpaid_session_does_not_provision() {
    let ctx = create_test_context();
    let snapshot = sample_snapshot();

    let mut metadata = std::collections::HashMap::new();
    metadata.insert(
        METADATA_FORM_DATA.to_string(),
        serde_json::to_string(&snapshot).unwrap(),
    );
    metadata.insert(METADATA_SELECTED_PLAN.to_string(), "starter".to_string());
    ctx.payments.insert_session(CheckoutSession {
        id: "cs_test_unpaid".into(),
        url: None,
        payment_status: "unpaid".into(),
        customer_email: None,
        amount_total: None,
        metadata,
    });

    let db = ctx.state.db.clone();
    let response = complete(ctx.state, json!({ "session_id": "cs_test_unpaid" })).await;

    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["details"], msg::PAYMENT_NOT_COMPLETED);

    let conn = db.get().unwrap();
    assert_eq!(queries::count_profiles(&conn).unwrap(), 0);
    assert_eq!(ctx.identity.user_count(), 0);
}

#[tokio::test]
async fn paid_session_with_unrecoverable_metadata_is_a_distinct_error() {
    let ctx = create_test_context();
    let mut metadata = std::collections::HashMap::new();
    metadata.insert(METADATA_FORM_DATA.to_string(), "{corrupt".to_string());
    ctx.payments.insert_session(CheckoutSession {
        id: "cs_test_corrupt".into(),
        url: None,
        payment_status: PAYMENT_STATUS_PAID.into(),
        customer_email: Some("a@b.com".into()),
        amount_total: Some(9900),
        metadata,
    });

    let response = complete(ctx.state, json!({ "session_id": "cs_test_corrupt" })).await;

    assert_eq!(
        response.status(),
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    );
    let body = response_json(response).await;
    assert_eq!(body["details"], msg::FORM_DATA_UNRECOVERABLE);
}

#[tokio::test]
async fn identity_failure_writes_no_profile() {
    let ctx = create_test_context();
    ctx.identity
        .fail_sign_up
        .store(true, std::sync::atomic::Ordering::SeqCst);
    ctx.payments
        .insert_paid_session("cs_test_fail", &sample_snapshot(), Plan::Starter);

    let db = ctx.state.db.clone();
    let response = complete(ctx.state, json!({ "session_id": "cs_test_fail" })).await;

    assert_eq!(
        response.status(),
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    );

    // No profile without an identity - the atomicity rule.
    let conn = db.get().unwrap();
    assert_eq!(queries::count_profiles(&conn).unwrap(), 0);
}

#[tokio::test]
async fn crm_mirror_failure_does_not_fail_provisioning() {
    let ctx = create_test_context();
    ctx.crm
        .fail_create_lead
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let snapshot = sample_snapshot();
    let service = ProvisioningService::new(
        ctx.identity.clone(),
        ctx.crm.clone(),
        ctx.state.db.clone(),
    );

    let account = service
        .provision(&snapshot, Plan::Starter)
        .await
        .expect("provisioning must succeed despite CRM failure");

    // Await the detached mirror so its failure path has definitely run.
    account.crm_mirror.await.unwrap();
    assert_eq!(ctx.crm.lead_count(), 0);

    let conn = ctx.state.db.get().unwrap();
    let profile = queries::get_profile_by_id(&conn, &account.user.id)
        .unwrap()
        .expect("profile written");
    assert_eq!(profile.payment_status, "completed");
}

#[tokio::test]
async fn successful_provisioning_mirrors_the_lead() {
    let ctx = create_test_context();
    let service = ProvisioningService::new(
        ctx.identity.clone(),
        ctx.crm.clone(),
        ctx.state.db.clone(),
    );

    let account = service
        .provision(&sample_snapshot(), Plan::Pro)
        .await
        .unwrap();
    account.crm_mirror.await.unwrap();

    assert_eq!(ctx.crm.lead_count(), 1);
    let leads = ctx.crm.leads.lock().unwrap();
    assert_eq!(leads[0].email, "dale@mercerroofing.com");
    assert_eq!(leads[0].company_name, "Mercer Roofing");
}

#[tokio::test]
async fn duplicate_completion_surfaces_account_exists() {
    let ctx = create_test_context();
    ctx.payments
        .insert_paid_session("cs_test_dup", &sample_snapshot(), Plan::Starter);

    let first = complete(ctx.state.clone(), json!({ "session_id": "cs_test_dup" })).await;
    assert_eq!(first.status(), axum::http::StatusCode::OK);

    // Reloading the return URL replays verification + provisioning; the
    // identity provider's uniqueness constraint stops the second run.
    let second = complete(ctx.state.clone(), json!({ "session_id": "cs_test_dup" })).await;
    assert_eq!(second.status(), axum::http::StatusCode::CONFLICT);
    let body = response_json(second).await;
    assert_eq!(body["details"], msg::ACCOUNT_EXISTS);

    let conn = ctx.state.db.get().unwrap();
    assert_eq!(queries::count_profiles(&conn).unwrap(), 1);
}

#[tokio::test]
async fn end_to_end_signup_flow() {
    let ctx = create_test_context();
    let snapshot = sample_snapshot();

    // Submit the form: create the checkout session.
    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/checkout/session")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(
                        &json!({ "formData": snapshot, "selectedPlan": "starter" }),
                    )
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = response_json(response).await;
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    // The user pays on the hosted page.
    ctx.payments.mark_paid(&session_id);

    // The browser returns with the session id; verification recovers the
    // original snapshot.
    let verified = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/checkout/verify")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&json!({ "session_id": session_id })).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let verified = response_json(verified).await;
    assert_eq!(verified["paid"], true);
    let recovered: SignupSnapshot = serde_json::from_value(verified["formData"].clone()).unwrap();
    assert_eq!(recovered, snapshot);

    // Completion provisions the account from the recovered snapshot.
    let completed = complete(ctx.state.clone(), json!({ "session_id": session_id })).await;
    assert_eq!(completed.status(), axum::http::StatusCode::OK);
    let completed = response_json(completed).await;
    assert_eq!(completed["success"], true);
    assert_eq!(completed["email"], "dale@mercerroofing.com");
    assert_eq!(completed["selectedPlan"], "starter");

    let conn = ctx.state.db.get().unwrap();
    let profile = queries::get_profile_by_email(&conn, "dale@mercerroofing.com")
        .unwrap()
        .expect("profile provisioned");
    assert_eq!(profile.payment_status, "completed");
    assert_eq!(profile.selected_plan, "starter");
    assert_eq!(profile.role, Role::User);
    assert_eq!(profile.first_name, "Dale");
    assert!(!profile.has_agent_number);
}
