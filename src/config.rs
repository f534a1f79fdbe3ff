use std::env;

use crate::error::{AppError, Result};

/// Server configuration, loaded from the environment once at startup.
///
/// Required credentials fail fast here instead of surfacing as confusing
/// provider errors on the first request.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Public site base URL; checkout success/cancel redirects land here.
    pub site_url: String,
    pub stripe_secret_key: String,
    /// Auth provider (identity + session) REST base URL.
    pub auth_url: String,
    /// Publishable auth key, sent with end-user signup calls.
    pub auth_anon_key: String,
    /// Service-role key for the privileged admin surface.
    pub auth_service_role_key: String,
    pub crm_api_key: String,
    pub crm_location_id: String,
    pub workflow_webhook_url: String,
    pub super_admin_secret: String,
    pub dev_mode: bool,
}

fn require(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("{} is not set", name)))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("CREWLINE_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let site_url =
            env::var("SITE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Ok(Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "crewline.db".to_string()),
            site_url,
            stripe_secret_key: require("STRIPE_SECRET_KEY")?,
            auth_url: require("AUTH_URL")?,
            auth_anon_key: require("AUTH_ANON_KEY")?,
            auth_service_role_key: require("AUTH_SERVICE_ROLE_KEY")?,
            crm_api_key: require("CRM_API_KEY")?,
            crm_location_id: require("CRM_LOCATION_ID")?,
            workflow_webhook_url: require("WORKFLOW_WEBHOOK_URL")?,
            super_admin_secret: require("SUPER_ADMIN_SECRET")?,
            dev_mode,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
