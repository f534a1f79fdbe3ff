//! Deferred account provisioning.
//!
//! Accounts are only ever created here, after payment has been verified for
//! the signup snapshot. Step order matters:
//!
//! 1. Create the auth identity (the provider's email uniqueness constraint
//!    doubles as the replay guard for reloaded return URLs).
//! 2. Insert the profile row with `payment_status = completed`.
//! 3. Mirror the lead into the CRM as a detached task.
//!
//! A step-2 failure leaves an orphaned identity with no profile. There is no
//! compensating delete; the failure is logged at error level for operator
//! intervention.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::crm::{CrmClient, CrmLead};
use crate::db::{queries, AppState, DbPool};
use crate::error::Result;
use crate::identity::{Identity, IdentityProvider};
use crate::models::{NewProfile, Plan, Profile, SignupSnapshot};

#[derive(Debug)]
pub struct ProvisionedAccount {
    pub user: Identity,
    pub profile: Profile,
    /// Session token from identity creation, when the provider returned one.
    pub access_token: Option<String>,
    /// Handle for the detached CRM mirror. Production callers drop it; tests
    /// await it to observe the side effect deterministically.
    pub crm_mirror: JoinHandle<()>,
}

#[derive(Clone)]
pub struct ProvisioningService {
    identity: Arc<dyn IdentityProvider>,
    crm: Arc<dyn CrmClient>,
    db: DbPool,
}

impl ProvisioningService {
    pub fn new(identity: Arc<dyn IdentityProvider>, crm: Arc<dyn CrmClient>, db: DbPool) -> Self {
        Self { identity, crm, db }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.identity.clone(), state.crm.clone(), state.db.clone())
    }

    /// Create the identity and profile for a verified, paid signup snapshot.
    ///
    /// Must only be called after payment verification. Each step's failure
    /// terminates the flow with its own error; the CRM mirror is exempt and
    /// never affects the result.
    pub async fn provision(
        &self,
        snapshot: &SignupSnapshot,
        plan: Plan,
    ) -> Result<ProvisionedAccount> {
        snapshot.validate()?;

        let signup = self
            .identity
            .sign_up(&snapshot.email, &snapshot.password)
            .await?;

        let profile = {
            let conn = self.db.get()?;
            let input = NewProfile::from_snapshot(&signup.user.id, snapshot, plan);
            match queries::create_profile(&conn, &input) {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::error!(
                        identity_id = %signup.user.id,
                        email = %snapshot.email,
                        "Profile creation failed after identity creation; \
                         orphaned identity requires operator intervention: {}",
                        e
                    );
                    return Err(e);
                }
            }
        };

        let crm_mirror = self.spawn_crm_mirror(snapshot, plan);

        tracing::info!(
            user_id = %signup.user.id,
            plan = plan.as_str(),
            "Provisioned account after verified payment"
        );

        Ok(ProvisionedAccount {
            user: signup.user,
            profile,
            access_token: signup.access_token,
            crm_mirror,
        })
    }

    /// Best-effort lead mirror. Detached: the outcome is observed only by
    /// logging and never rolls back a paid account.
    fn spawn_crm_mirror(&self, snapshot: &SignupSnapshot, plan: Plan) -> JoinHandle<()> {
        let crm = self.crm.clone();
        let lead = CrmLead::from_snapshot(snapshot, plan);
        tokio::spawn(async move {
            if let Err(e) = crm.create_lead(&lead).await {
                tracing::warn!(email = %lead.email, "CRM lead mirror failed (ignored): {}", e);
            }
        })
    }
}
