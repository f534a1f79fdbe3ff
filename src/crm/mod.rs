mod http;

pub use http::*;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::models::{Plan, SignupSnapshot};

/// CRM custom-field identifiers. Opaque keys assigned by the CRM; treat as
/// configuration constants, never parse meaning out of them.
pub mod fields {
    pub const YEARS_IN_BUSINESS: &str = "v0eGTMj6rFuXji4r1Omp";
    pub const AVERAGE_JOB_VALUE: &str = "7nra59HgaNb7SxfojKLS";
    pub const CALL_VOLUME: &str = "M4uxUGl6zMF4ODz5A3Ju";
    pub const CURRENT_CHALLENGES: &str = "hGuGil82mHIRP8ytL7vy";
    pub const PREFERRED_START_DATE: &str = "SBzpHwGMzeyJiCPpjN1p";
    pub const HEAR_ABOUT_US: &str = "Pz5nZm958YTBtXD2gPMN";
    pub const SELECTED_PLAN: &str = "quFCVTG7j5iVly7ngoig";
    pub const BUSINESS_TYPE: &str = "HIedxID7MPkTo3JOyJIB";
    /// The provisioned answering number, mirrored onto the CRM contact by
    /// the workflow engine.
    pub const AGENT_NUMBER: &str = "Znuo3CRbsgviZTDokZyH";
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrmCustomField {
    pub id: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrmContact {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "customFields")]
    pub custom_fields: Vec<CrmCustomField>,
}

impl CrmContact {
    /// Non-empty value of a custom field, if the contact carries it.
    pub fn custom_field(&self, field_id: &str) -> Option<String> {
        self.custom_fields
            .iter()
            .find(|f| f.id == field_id)
            .and_then(|f| f.value.clone())
            .filter(|v| !v.is_empty())
    }
}

/// A signup mirrored into the CRM as a lead record.
#[derive(Debug, Clone)]
pub struct CrmLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub address1: String,
    pub company_name: String,
    pub state: String,
    pub postal_code: String,
    /// (custom field id, value) pairs.
    pub custom_fields: Vec<(&'static str, String)>,
}

impl CrmLead {
    /// Map a paid signup snapshot onto the CRM's lead shape.
    pub fn from_snapshot(snapshot: &SignupSnapshot, plan: Plan) -> Self {
        Self {
            first_name: snapshot.first_name.clone(),
            last_name: snapshot.last_name.clone(),
            email: snapshot.email.clone(),
            phone: snapshot.phone.clone(),
            city: snapshot.city.clone(),
            address1: snapshot.address.clone(),
            company_name: snapshot.company.clone(),
            state: snapshot.state.clone(),
            postal_code: snapshot.zip_code.clone(),
            custom_fields: vec![
                (fields::YEARS_IN_BUSINESS, snapshot.years_in_business.clone()),
                (fields::AVERAGE_JOB_VALUE, snapshot.average_job_value.clone()),
                (fields::CALL_VOLUME, snapshot.call_volume.clone()),
                (fields::CURRENT_CHALLENGES, snapshot.current_challenges.clone()),
                (
                    fields::PREFERRED_START_DATE,
                    snapshot.preferred_start_date.clone(),
                ),
                (fields::HEAR_ABOUT_US, snapshot.hear_about_us.clone()),
                (fields::SELECTED_PLAN, plan.as_str().to_string()),
                (fields::BUSINESS_TYPE, snapshot.business_type.clone()),
            ],
        }
    }
}

/// CRM contacts API seam.
#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Create a lead record. Callers treat this as best-effort; failures are
    /// logged, never propagated into the signup result.
    async fn create_lead(&self, lead: &CrmLead) -> Result<()>;

    /// Find the contact whose email matches exactly.
    async fn find_contact_by_email(&self, email: &str) -> Result<Option<CrmContact>>;
}
