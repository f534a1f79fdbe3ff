use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::error::{AppError, Result};

use super::{WorkflowAck, WorkflowClient};

/// HTTP client for the workflow engine's inbound webhook.
#[derive(Debug, Clone)]
pub struct HttpWorkflowClient {
    client: Client,
    webhook_url: String,
}

impl HttpWorkflowClient {
    pub fn new(webhook_url: &str) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.to_string(),
        }
    }
}

#[async_trait]
impl WorkflowClient for HttpWorkflowClient {
    async fn trigger_number_purchase(&self, payload: &serde_json::Value) -> Result<WorkflowAck> {
        let response = self
            .client
            .post(&self.webhook_url)
            .header("User-Agent", "Crewline/1.0")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                AppError::Provider(format!("Failed to connect to workflow webhook: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Workflow webhook returned {}: {}",
                status, body
            )));
        }

        // The engine may answer with JSON, plain text, or nothing at all.
        let text = response.text().await.unwrap_or_default();
        let body = if text.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| json!({ "message": text }))
        };

        Ok(WorkflowAck { body })
    }
}
