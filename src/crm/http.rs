use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};

use super::{CrmClient, CrmContact, CrmLead};

const API_BASE: &str = "https://services.leadconnectorhq.com";
/// Pinned CRM API version header; the contacts surface is versioned by date.
const API_VERSION: &str = "2021-07-28";

/// HTTP client for the contacts CRM.
#[derive(Debug, Clone)]
pub struct HttpCrmClient {
    client: Client,
    api_key: String,
    location_id: String,
}

#[derive(Debug, Deserialize)]
struct ContactListResponse {
    #[serde(default)]
    contacts: Vec<CrmContact>,
}

impl HttpCrmClient {
    pub fn new(api_key: &str, location_id: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            location_id: location_id.to_string(),
        }
    }
}

#[async_trait]
impl CrmClient for HttpCrmClient {
    async fn create_lead(&self, lead: &CrmLead) -> Result<()> {
        let custom_fields: Vec<serde_json::Value> = lead
            .custom_fields
            .iter()
            .map(|(id, value)| json!({ "id": id, "value": value }))
            .collect();

        let response = self
            .client
            .post(format!("{}/contacts/", API_BASE))
            .bearer_auth(&self.api_key)
            .header("Version", API_VERSION)
            .json(&json!({
                "locationId": self.location_id,
                "type": "lead",
                "firstName": lead.first_name,
                "lastName": lead.last_name,
                "email": lead.email,
                "phone": lead.phone,
                "city": lead.city,
                "address1": lead.address1,
                "companyName": lead.company_name,
                "state": lead.state,
                "postalCode": lead.postal_code,
                "customFields": custom_fields,
            }))
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("CRM error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "CRM rejected lead ({}): {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<CrmContact>> {
        let response = self
            .client
            .get(format!("{}/contacts/", API_BASE))
            .query(&[("locationId", self.location_id.as_str())])
            .bearer_auth(&self.api_key)
            .header("Version", API_VERSION)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("CRM error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "CRM contact lookup failed ({}): {}",
                status, body
            )));
        }

        let list: ContactListResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse CRM response: {}", e)))?;

        Ok(list
            .contacts
            .into_iter()
            .find(|c| c.email.as_deref() == Some(email)))
    }
}
