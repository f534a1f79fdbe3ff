mod http;

pub use http::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An authentication principal at the external auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Result of an end-user signup. Identity creation implicitly establishes a
/// session, so the access token (when the provider returns one) lets the
/// caller land in an authenticated state without a separate login.
#[derive(Debug, Clone)]
pub struct AuthSignup {
    pub user: Identity,
    pub access_token: Option<String>,
}

/// External auth provider seam.
///
/// The provider's email uniqueness constraint is the only guard against
/// double provisioning - `sign_up` for an existing email must fail with a
/// conflict, never return a second identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an identity with the end-user signup flow.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSignup>;

    /// Create an identity through the privileged admin surface, with email
    /// confirmation bypassed.
    async fn admin_create_user(&self, email: &str, password: &str) -> Result<Identity>;

    /// Privileged lookup of an existing identity by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<Identity>>;

    /// Resolve an access token to its identity. Returns None for a missing
    /// or expired session rather than an error.
    async fn get_session_user(&self, access_token: &str) -> Result<Option<Identity>>;
}
