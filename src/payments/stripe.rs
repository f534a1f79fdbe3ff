use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};

use super::{CheckoutProvider, CheckoutSession, CreateCheckout};

const API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: Option<String>,
    payment_status: String,
    customer_email: Option<String>,
    amount_total: Option<i64>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl From<CheckoutSessionResponse> for CheckoutSession {
    fn from(r: CheckoutSessionResponse) -> Self {
        CheckoutSession {
            id: r.id,
            url: r.url,
            payment_status: r.payment_status,
            customer_email: r.customer_email,
            amount_total: r.amount_total,
            metadata: r.metadata,
        }
    }
}

/// Stripe-backed checkout provider. Sessions are created with ad-hoc
/// price_data from the server-side plan table, so no dashboard price
/// objects need to exist.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.to_string(),
        }
    }
}

#[async_trait]
impl CheckoutProvider for StripeClient {
    async fn create_checkout_session(&self, request: &CreateCheckout) -> Result<CheckoutSession> {
        let amount = request.amount_cents.to_string();
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("payment_method_types[0]".into(), "card".into()),
            ("success_url".into(), request.success_url.clone()),
            ("cancel_url".into(), request.cancel_url.clone()),
            ("customer_email".into(), request.customer_email.clone()),
            ("line_items[0][quantity]".into(), "1".into()),
            (
                "line_items[0][price_data][currency]".into(),
                "usd".into(),
            ),
            (
                "line_items[0][price_data][unit_amount]".into(),
                amount,
            ),
            (
                "line_items[0][price_data][product_data][name]".into(),
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][product_data][description]".into(),
                request.product_description.clone(),
            ),
        ];
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
        }

        let response = self
            .client
            .post(format!("{}/checkout/sessions", API_BASE))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let session: CheckoutSessionResponse = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(session.into())
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", API_BASE, session_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let session: CheckoutSessionResponse = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(session.into())
    }
}
