use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};

/// Basic email format validation.
///
/// Intentionally permissive: one @, non-empty local part, dotted domain.
/// Not RFC 5322 - just a sanity check before we hand the address to the
/// auth provider.
pub fn validate_email_format(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(AppError::BadRequest(msg::EMAIL_EMPTY.into()));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }

    let local_part = parts[0];
    let domain_part = parts[1];

    if local_part.is_empty() || local_part.contains(' ') {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }

    if domain_part.is_empty()
        || !domain_part.contains('.')
        || domain_part.starts_with('.')
        || domain_part.ends_with('.')
    {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }

    Ok(())
}

/// The complete signup form payload captured at submission time.
///
/// The snapshot is serialized whole into checkout-session metadata and
/// recovered whole after payment confirmation. Aside from `email`,
/// `password`, and the plan, fields are never interpreted here - they are
/// copied opaquely into the profile row at provisioning time.
///
/// Wire format is camelCase because the browser form posts it that way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub company: String,
    pub business_type: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub years_in_business: String,
    pub average_job_value: String,
    pub call_volume: String,
    pub current_challenges: String,
    pub preferred_start_date: String,
    pub hear_about_us: String,
    pub selected_plan: String,
}

impl SignupSnapshot {
    /// Validate the fields the provisioning flow actually splits out.
    /// Everything else is opaque and passes through unchecked.
    pub fn validate(&self) -> Result<()> {
        validate_email_format(&self.email)?;
        if self.password.is_empty() {
            return Err(AppError::BadRequest(msg::PASSWORD_EMPTY.into()));
        }
        Ok(())
    }
}
