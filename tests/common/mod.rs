//! Test utilities and fixtures for Crewline integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

pub use crewline::bootstrap::{Bootstrapper, NumberStatus, NOT_ASSIGNED};
pub use crewline::db::{init_db, queries, AppState, DbPool};
pub use crewline::error::{msg, AppError, Result};
pub use crewline::handlers;
pub use crewline::models::{NewProfile, Plan, Profile, Role, SignupSnapshot};
pub use crewline::payments::{
    CheckoutProvider, CheckoutSession, CreateCheckout, METADATA_FORM_DATA, METADATA_SELECTED_PLAN,
    PAYMENT_STATUS_PAID,
};
pub use crewline::provisioning::ProvisioningService;

use crewline::crm::{CrmClient, CrmContact, CrmCustomField, CrmLead};
use crewline::identity::{AuthSignup, Identity, IdentityProvider};
use crewline::workflow::{WorkflowAck, WorkflowClient};

pub const TEST_ADMIN_SECRET: &str = "test-admin-secret";

/// Single-connection in-memory pool so every pool checkout sees the same
/// database.
pub fn setup_test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

/// In-process checkout provider: sessions live in a map, tests mark them
/// paid directly.
#[derive(Default)]
pub struct MockCheckoutProvider {
    pub sessions: Mutex<HashMap<String, CheckoutSession>>,
    pub fail: AtomicBool,
}

impl MockCheckoutProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_session(&self, session: CheckoutSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    /// Register a paid session carrying the given snapshot in its metadata,
    /// as the provider would after a completed hosted checkout.
    pub fn insert_paid_session(&self, id: &str, snapshot: &SignupSnapshot, plan: Plan) {
        let mut metadata = HashMap::new();
        metadata.insert(
            METADATA_FORM_DATA.to_string(),
            serde_json::to_string(snapshot).unwrap(),
        );
        metadata.insert(
            METADATA_SELECTED_PLAN.to_string(),
            plan.as_str().to_string(),
        );
        self.insert_session(CheckoutSession {
            id: id.to_string(),
            url: None,
            payment_status: PAYMENT_STATUS_PAID.to_string(),
            customer_email: Some(snapshot.email.clone()),
            amount_total: Some(plan.amount_cents()),
            metadata,
        });
    }

    /// Flip an existing session to paid (e.g. one created through the
    /// handler), simulating checkout completion.
    pub fn mark_paid(&self, id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.get_mut(id).expect("unknown session");
        session.payment_status = PAYMENT_STATUS_PAID.to_string();
    }
}

#[async_trait]
impl CheckoutProvider for MockCheckoutProvider {
    async fn create_checkout_session(&self, request: &CreateCheckout) -> Result<CheckoutSession> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Provider("payment provider unavailable".into()));
        }
        let id = format!("cs_test_{}", uuid::Uuid::new_v4().simple());
        let session = CheckoutSession {
            id: id.clone(),
            url: Some(format!("https://checkout.test/pay/{}", id)),
            payment_status: "unpaid".to_string(),
            customer_email: Some(request.customer_email.clone()),
            amount_total: Some(request.amount_cents),
            metadata: request.metadata.clone(),
        };
        self.insert_session(session.clone());
        Ok(session)
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Provider("payment provider unavailable".into()));
        }
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::Provider(format!("No such session: {}", session_id)))
    }
}

/// In-process auth provider with the same email-uniqueness guarantee the
/// real one gives.
#[derive(Default)]
pub struct MockIdentityProvider {
    pub users: Mutex<HashMap<String, Identity>>,
    pub tokens: Mutex<HashMap<String, Identity>>,
    pub fail_sign_up: AtomicBool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Seed an identity and return an access token for it.
    pub fn seed_session(&self, id: &str, email: &str) -> String {
        let identity = Identity {
            id: id.to_string(),
            email: email.to_string(),
            created_at: None,
        };
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), identity.clone());
        let token = format!("token-{}", id);
        self.tokens.lock().unwrap().insert(token.clone(), identity);
        token
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_up(&self, email: &str, _password: &str) -> Result<AuthSignup> {
        if self.fail_sign_up.load(Ordering::SeqCst) {
            return Err(AppError::Provider("identity provider unavailable".into()));
        }
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(AppError::Conflict(msg::ACCOUNT_EXISTS.into()));
        }
        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            created_at: None,
        };
        users.insert(email.to_string(), identity.clone());
        let token = format!("token-{}", identity.id);
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), identity.clone());
        Ok(AuthSignup {
            user: identity,
            access_token: Some(token),
        })
    }

    async fn admin_create_user(&self, email: &str, _password: &str) -> Result<Identity> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(AppError::Conflict(msg::ACCOUNT_EXISTS.into()));
        }
        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            created_at: None,
        };
        users.insert(email.to_string(), identity.clone());
        Ok(identity)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn get_session_user(&self, access_token: &str) -> Result<Option<Identity>> {
        Ok(self.tokens.lock().unwrap().get(access_token).cloned())
    }
}

/// In-process CRM: records mirrored leads, serves seeded contacts.
#[derive(Default)]
pub struct MockCrmClient {
    pub contacts: Mutex<Vec<CrmContact>>,
    pub leads: Mutex<Vec<CrmLead>>,
    pub fail_create_lead: AtomicBool,
    pub lookups: AtomicUsize,
}

impl MockCrmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_contact(&self, email: &str, field_id: &str, value: &str) {
        self.contacts.lock().unwrap().push(CrmContact {
            id: format!("contact-{}", email),
            email: Some(email.to_string()),
            custom_fields: vec![CrmCustomField {
                id: field_id.to_string(),
                value: Some(value.to_string()),
            }],
        });
    }

    pub fn lead_count(&self) -> usize {
        self.leads.lock().unwrap().len()
    }
}

#[async_trait]
impl CrmClient for MockCrmClient {
    async fn create_lead(&self, lead: &CrmLead) -> Result<()> {
        if self.fail_create_lead.load(Ordering::SeqCst) {
            return Err(AppError::Provider("CRM returned 500".into()));
        }
        self.leads.lock().unwrap().push(lead.clone());
        Ok(())
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<CrmContact>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .contacts
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.email.as_deref() == Some(email))
            .cloned())
    }
}

/// What the mock workflow engine should answer with.
pub enum WorkflowMode {
    Ack(serde_json::Value),
    Upstream(String),
    ConnectFailure(String),
}

pub struct MockWorkflowClient {
    pub mode: Mutex<WorkflowMode>,
    pub triggers: Mutex<Vec<serde_json::Value>>,
}

impl MockWorkflowClient {
    pub fn new() -> Self {
        Self {
            mode: Mutex::new(WorkflowMode::Ack(serde_json::json!({}))),
            triggers: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: WorkflowMode) {
        *self.mode.lock().unwrap() = mode;
    }
}

#[async_trait]
impl WorkflowClient for MockWorkflowClient {
    async fn trigger_number_purchase(&self, payload: &serde_json::Value) -> Result<WorkflowAck> {
        self.triggers.lock().unwrap().push(payload.clone());
        match &*self.mode.lock().unwrap() {
            WorkflowMode::Ack(body) => Ok(WorkflowAck { body: body.clone() }),
            WorkflowMode::Upstream(message) => Err(AppError::Upstream(message.clone())),
            WorkflowMode::ConnectFailure(message) => Err(AppError::Provider(message.clone())),
        }
    }
}

/// App state plus handles to the mock collaborators behind it.
pub struct TestContext {
    pub state: AppState,
    pub payments: Arc<MockCheckoutProvider>,
    pub identity: Arc<MockIdentityProvider>,
    pub crm: Arc<MockCrmClient>,
    pub workflow: Arc<MockWorkflowClient>,
}

pub fn create_test_context() -> TestContext {
    let payments = Arc::new(MockCheckoutProvider::new());
    let identity = Arc::new(MockIdentityProvider::new());
    let crm = Arc::new(MockCrmClient::new());
    let workflow = Arc::new(MockWorkflowClient::new());

    let state = AppState {
        db: setup_test_pool(),
        site_url: "http://localhost:3000".to_string(),
        payments: payments.clone(),
        identity: identity.clone(),
        crm: crm.clone(),
        workflow: workflow.clone(),
        super_admin_secret: TEST_ADMIN_SECRET.to_string(),
    };

    TestContext {
        state,
        payments,
        identity,
        crm,
        workflow,
    }
}

pub fn app(state: AppState) -> Router {
    handlers::router().with_state(state)
}

/// A representative signup snapshot.
pub fn sample_snapshot() -> SignupSnapshot {
    SignupSnapshot {
        first_name: "Dale".into(),
        last_name: "Mercer".into(),
        email: "dale@mercerroofing.com".into(),
        password: "hunter2!".into(),
        confirm_password: "hunter2!".into(),
        phone: "+15551234567".into(),
        company: "Mercer Roofing".into(),
        business_type: "roofing".into(),
        address: "600 Congress Ave".into(),
        city: "Austin".into(),
        state: "TX".into(),
        zip_code: "78701".into(),
        years_in_business: "12".into(),
        average_job_value: "8500".into(),
        call_volume: "daily".into(),
        current_challenges: "missing calls on the roof".into(),
        preferred_start_date: "2025-08-01".into(),
        hear_about_us: "referral".into(),
        selected_plan: "starter".into(),
    }
}

/// Insert a minimal paid-user profile directly, for tests that start after
/// provisioning.
pub fn seed_profile(pool: &DbPool, id: &str, email: &str) -> Profile {
    let conn = pool.get().unwrap();
    let snapshot = SignupSnapshot {
        email: email.to_string(),
        first_name: "Test".into(),
        last_name: "User".into(),
        ..Default::default()
    };
    let input = NewProfile::from_snapshot(id, &snapshot, Plan::Starter);
    queries::create_profile(&conn, &input).unwrap()
}

pub async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).expect("Response should be valid JSON")
}
