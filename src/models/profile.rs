use serde::{Deserialize, Serialize};

use super::{Plan, SignupSnapshot};

/// Payment status recorded on a profile at provisioning time.
pub mod payment_status {
    /// Normal signups: payment verified before the row exists.
    pub const COMPLETED: &str = "completed";
    /// Privileged accounts created outside the payment flow.
    pub const EXEMPT: &str = "exempt";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            _ => Err(()),
        }
    }
}

/// The application's own record of a user, one-to-one with an auth identity.
/// `id` is the identity provider's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
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
    pub payment_status: String,
    pub role: Role,
    /// Provisioned answering number, if the workflow engine has delivered one.
    pub agent_number: Option<String>,
    /// Kept consistent with `agent_number` presence; writes go through a
    /// single query that sets both.
    pub has_agent_number: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for the single profile INSERT performed at provisioning time.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
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
    pub payment_status: String,
    pub role: Role,
}

impl NewProfile {
    /// Copy a verified signup snapshot into a profile row for the given
    /// identity. The password never lands here; it lives only with the auth
    /// provider.
    pub fn from_snapshot(identity_id: &str, snapshot: &SignupSnapshot, plan: Plan) -> Self {
        Self {
            id: identity_id.to_string(),
            email: snapshot.email.clone(),
            first_name: snapshot.first_name.clone(),
            last_name: snapshot.last_name.clone(),
            phone: snapshot.phone.clone(),
            company: snapshot.company.clone(),
            business_type: snapshot.business_type.clone(),
            address: snapshot.address.clone(),
            city: snapshot.city.clone(),
            state: snapshot.state.clone(),
            zip_code: snapshot.zip_code.clone(),
            years_in_business: snapshot.years_in_business.clone(),
            average_job_value: snapshot.average_job_value.clone(),
            call_volume: snapshot.call_volume.clone(),
            current_challenges: snapshot.current_challenges.clone(),
            preferred_start_date: snapshot.preferred_start_date.clone(),
            hear_about_us: snapshot.hear_about_us.clone(),
            selected_plan: plan.as_str().to_string(),
            payment_status: payment_status::COMPLETED.to_string(),
            role: Role::User,
        }
    }

    /// Placeholder profile for a privileged account provisioned outside the
    /// payment flow.
    pub fn super_admin(identity_id: &str, email: &str) -> Self {
        Self {
            id: identity_id.to_string(),
            email: email.to_string(),
            first_name: "Super".to_string(),
            last_name: "Admin".to_string(),
            phone: "+1-555-000-0000".to_string(),
            company: "Crewline Admin".to_string(),
            business_type: "other".to_string(),
            address: String::new(),
            city: "Admin".to_string(),
            state: "Admin".to_string(),
            zip_code: String::new(),
            years_in_business: String::new(),
            average_job_value: String::new(),
            call_volume: String::new(),
            current_challenges: String::new(),
            preferred_start_date: String::new(),
            hear_about_us: String::new(),
            selected_plan: String::new(),
            payment_status: payment_status::EXEMPT.to_string(),
            role: Role::SuperAdmin,
        }
    }
}

/// User-editable profile fields for partial updates. `role`,
/// `payment_status`, and the number pair are deliberately absent - those
/// change only through their own privileged or callback paths.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub business_type: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub years_in_business: Option<String>,
    pub average_job_value: Option<String>,
    pub call_volume: Option<String>,
    pub current_challenges: Option<String>,
    pub preferred_start_date: Option<String>,
    pub hear_about_us: Option<String>,
}
