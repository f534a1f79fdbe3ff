use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::error::{msg, AppError, Result};

use super::{AuthSignup, Identity, IdentityProvider};

/// HTTP client for the hosted auth service (GoTrue-style REST surface).
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    email: String,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<UserPayload> for Identity {
    fn from(u: UserPayload) -> Self {
        Identity {
            id: u.id,
            email: u.email,
            created_at: u.created_at,
        }
    }
}

/// Signup responses arrive in two shapes: a session envelope with a nested
/// user (auto-confirm on) or a bare user object (confirmation pending).
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<UserPayload>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorPayload {
    fn text(&self) -> String {
        self.msg
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.error_description.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct UserListResponse {
    #[serde(default)]
    users: Vec<UserPayload>,
}

impl AuthClient {
    pub fn new(base_url: &str, anon_key: &str, service_role_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            service_role_key: service_role_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    /// Map an auth provider rejection. Duplicate-email rejections become
    /// the account-exists conflict the signup flow surfaces to the user.
    async fn rejection(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let text = serde_json::from_str::<ErrorPayload>(&body)
            .map(|p| p.text())
            .unwrap_or_default();
        let text = if text.is_empty() { body } else { text };

        let duplicate = status == StatusCode::UNPROCESSABLE_ENTITY
            || text.to_lowercase().contains("already registered")
            || text.to_lowercase().contains("already been registered");
        if duplicate {
            AppError::Conflict(msg::ACCOUNT_EXISTS.into())
        } else {
            AppError::Provider(format!("Auth provider error ({}): {}", status, text))
        }
    }
}

#[async_trait]
impl IdentityProvider for AuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSignup> {
        let response = self
            .client
            .post(self.url("/signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Auth provider error: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let payload: SignUpResponse = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse auth response: {}", e))
        })?;

        let user = match (payload.user, payload.id) {
            (Some(user), _) => user.into(),
            (None, Some(id)) => Identity {
                id,
                email: payload.email.unwrap_or_else(|| email.to_string()),
                created_at: payload.created_at,
            },
            (None, None) => {
                return Err(AppError::Provider(
                    "Auth provider returned no user for signup".into(),
                ))
            }
        };

        Ok(AuthSignup {
            user,
            access_token: payload.access_token,
        })
    }

    async fn admin_create_user(&self, email: &str, password: &str) -> Result<Identity> {
        let response = self
            .client
            .post(self.url("/admin/users"))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }))
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Auth provider error: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let user: UserPayload = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse auth response: {}", e))
        })?;

        Ok(user.into())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let response = self
            .client
            .get(self.url("/admin/users"))
            .query(&[("email", email)])
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Auth provider error: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let list: UserListResponse = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse auth response: {}", e))
        })?;

        // The list endpoint filters loosely; match the address exactly.
        Ok(list
            .users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(Into::into))
    }

    async fn get_session_user(&self, access_token: &str) -> Result<Option<Identity>> {
        let response = self
            .client
            .get(self.url("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Auth provider error: {}", e)))?;

        if response.status() == StatusCode::UNAUTHORIZED
            || response.status() == StatusCode::FORBIDDEN
        {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let user: UserPayload = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse auth response: {}", e))
        })?;

        Ok(Some(user.into()))
    }
}
