//! Session/profile bootstrap.
//!
//! On every application load (and on every auth-state transition) three
//! pieces of state are reconciled: the auth session, the profile row, and
//! the answering-number assignment. The number has two sources of truth -
//! the profile pair (`agent_number`/`has_agent_number`) and a CRM contact
//! custom field keyed by email. The profile wins outright when set; the CRM
//! is fallback-and-converge.

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;

use tokio::task::JoinHandle;

use crate::crm::{fields, CrmClient};
use crate::db::{queries, AppState, DbPool};
use crate::error::Result;
use crate::identity::{Identity, IdentityProvider};
use crate::models::Profile;

/// Displayed when neither the profile nor the CRM knows a number.
pub const NOT_ASSIGNED: &str = "Not assigned yet";

/// Number-resolution state for one session.
///
/// `Assigned` is terminal per session; `NotAssigned` only becomes
/// `Assigned` through a fresh bootstrap (e.g. after a purchase).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberStatus {
    Unknown,
    Checking,
    Assigned(String),
    NotAssigned,
}

/// Outcome of the pure number-resolution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberResolution {
    /// The number to display, or the [`NOT_ASSIGNED`] sentinel.
    pub value: String,
    pub assigned: bool,
    /// True iff the value came from the CRM while the profile had none:
    /// the caller should issue a convergence write so the two sources
    /// agree and future loads skip the CRM.
    pub should_persist: bool,
}

/// Resolve the answering number for a profile.
///
/// Fast path: a profile that carries its number is trusted outright and the
/// injected CRM lookup is never invoked. Otherwise the lookup runs; a hit
/// is adopted (and flagged for convergence), a miss or lookup failure
/// yields the sentinel.
pub async fn resolve_agent_number<F, Fut>(profile: &Profile, lookup: F) -> NumberResolution
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    if profile.has_agent_number {
        if let Some(number) = &profile.agent_number {
            return NumberResolution {
                value: number.clone(),
                assigned: true,
                should_persist: false,
            };
        }
    }

    if profile.email.is_empty() {
        return NumberResolution {
            value: NOT_ASSIGNED.to_string(),
            assigned: false,
            should_persist: false,
        };
    }

    match lookup(profile.email.clone()).await {
        Ok(Some(number)) => NumberResolution {
            value: number,
            assigned: true,
            should_persist: !profile.has_agent_number,
        },
        Ok(None) => NumberResolution {
            value: NOT_ASSIGNED.to_string(),
            assigned: false,
            should_persist: false,
        },
        Err(e) => {
            tracing::warn!(email = %profile.email, "CRM number lookup failed: {}", e);
            NumberResolution {
                value: NOT_ASSIGNED.to_string(),
                assigned: false,
                should_persist: false,
            }
        }
    }
}

/// Everything the UI needs to know about "who is the current user".
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub number: NumberStatus,
}

impl SessionState {
    /// The well-defined logged-out state: all three pieces cleared.
    pub fn logged_out() -> Self {
        Self {
            identity: None,
            profile: None,
            number: NumberStatus::Unknown,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some() && self.profile.is_some()
    }
}

/// A state transition driven by an auth event.
#[derive(Debug, Clone)]
pub enum AuthChange {
    /// Sign-out clears everything before dependent UI can render.
    SignedOut,
    /// A session resolved to an identity with its profile.
    SessionResolved {
        identity: Identity,
        profile: Profile,
    },
}

/// Holder for the current session state with last-write-wins ordering.
///
/// Auth events may fire while a previous profile fetch is still in flight;
/// each event carries a monotonically increasing sequence number and only
/// the newest ever lands. No request cancellation is modeled.
#[derive(Debug)]
pub struct SessionCell {
    inner: Mutex<(u64, SessionState)>,
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCell {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new((0, SessionState::logged_out())),
        }
    }

    /// Apply a transition for event `seq`. Returns false (and changes
    /// nothing) when a newer event has already been applied.
    pub fn apply(&self, seq: u64, change: AuthChange) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if seq < guard.0 {
            return false;
        }
        guard.0 = seq;
        guard.1 = match change {
            AuthChange::SignedOut => SessionState::logged_out(),
            AuthChange::SessionResolved { identity, profile } => SessionState {
                identity: Some(identity),
                profile: Some(profile),
                number: NumberStatus::Checking,
            },
        };
        true
    }

    /// Record the number resolution for event `seq`. Discarded when a newer
    /// event has superseded the session it was resolved for.
    pub fn set_number(&self, seq: u64, number: NumberStatus) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if seq != guard.0 {
            return false;
        }
        guard.1.number = number;
        true
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).1.clone()
    }
}

/// Resolves "who is the current user" from an access token.
#[derive(Clone)]
pub struct Bootstrapper {
    identity: Arc<dyn IdentityProvider>,
    crm: Arc<dyn CrmClient>,
    db: DbPool,
}

impl Bootstrapper {
    pub fn new(identity: Arc<dyn IdentityProvider>, crm: Arc<dyn CrmClient>, db: DbPool) -> Self {
        Self { identity, crm, db }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.identity.clone(), state.crm.clone(), state.db.clone())
    }

    /// Full bootstrap: token -> identity -> profile -> number.
    ///
    /// Any failure along the way resolves to the logged-out state; a
    /// dashboard is never shown with a session but no profile. The returned
    /// handle is the detached convergence write, when one was issued.
    pub async fn resolve(
        &self,
        access_token: Option<&str>,
    ) -> (SessionState, Option<JoinHandle<()>>) {
        let Some(token) = access_token else {
            return (SessionState::logged_out(), None);
        };

        let identity = match self.identity.get_session_user(token).await {
            Ok(Some(identity)) => identity,
            Ok(None) => return (SessionState::logged_out(), None),
            Err(e) => {
                tracing::warn!("Session lookup failed, treating as logged out: {}", e);
                return (SessionState::logged_out(), None);
            }
        };

        let profile = {
            let conn = match self.db.get() {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!("Profile fetch failed, treating as logged out: {}", e);
                    return (SessionState::logged_out(), None);
                }
            };
            match queries::get_profile_by_id(&conn, &identity.id) {
                Ok(Some(profile)) => profile,
                Ok(None) => return (SessionState::logged_out(), None),
                Err(e) => {
                    tracing::warn!("Profile fetch failed, treating as logged out: {}", e);
                    return (SessionState::logged_out(), None);
                }
            }
        };

        let (number, convergence) = self.resolve_number(&profile).await;

        (
            SessionState {
                identity: Some(identity),
                profile: Some(profile),
                number,
            },
            convergence,
        )
    }

    /// Resolve the number for a profile, issuing the convergence write as a
    /// detached task when the CRM filled a gap the profile had.
    pub async fn resolve_number(
        &self,
        profile: &Profile,
    ) -> (NumberStatus, Option<JoinHandle<()>>) {
        let crm = self.crm.clone();
        let resolution = resolve_agent_number(profile, move |email| async move {
            let contact = crm.find_contact_by_email(&email).await?;
            Ok(contact.and_then(|c| c.custom_field(fields::AGENT_NUMBER)))
        })
        .await;

        let convergence = if resolution.should_persist {
            Some(self.spawn_convergence_write(&profile.id, &resolution.value))
        } else {
            None
        };

        let status = if resolution.assigned {
            NumberStatus::Assigned(resolution.value)
        } else {
            NumberStatus::NotAssigned
        };
        (status, convergence)
    }

    /// Copy a CRM-sourced number back onto the profile so future loads take
    /// the fast path. Detached; failures are logged, never surfaced.
    fn spawn_convergence_write(&self, profile_id: &str, number: &str) -> JoinHandle<()> {
        let db = self.db.clone();
        let profile_id = profile_id.to_string();
        let number = number.to_string();
        tokio::spawn(async move {
            let result = db
                .get()
                .map_err(crate::error::AppError::from)
                .and_then(|conn| queries::set_agent_number(&conn, &profile_id, &number));
            match result {
                Ok(Some(_)) => {
                    tracing::debug!(profile_id = %profile_id, "Converged CRM number onto profile");
                }
                Ok(None) => {
                    tracing::warn!(profile_id = %profile_id, "Convergence write matched no profile");
                }
                Err(e) => {
                    tracing::warn!(profile_id = %profile_id, "Convergence write failed (ignored): {}", e);
                }
            }
        })
    }
}
