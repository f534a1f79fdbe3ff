mod http;

pub use http::*;

use async_trait::async_trait;

use crate::error::Result;

/// Synchronous acknowledgment from the workflow engine.
///
/// Number provisioning itself is asynchronous; the engine calls back later
/// with the purchased number. The ack body is relayed to the caller as-is.
#[derive(Debug, Clone)]
pub struct WorkflowAck {
    pub body: serde_json::Value,
}

impl WorkflowAck {
    /// Some workflows answer the trigger synchronously with the purchased
    /// number; when they do, the number can be saved without waiting for
    /// the callback.
    pub fn phone_number(&self) -> Option<&str> {
        if self.body.get("success").and_then(|v| v.as_bool()) != Some(true) {
            return None;
        }
        self.body
            .get("phoneNumber")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// Workflow-automation engine seam (number purchase trigger).
#[async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Forward a number-purchase intent. The payload is relayed verbatim;
    /// the engine's own nodes pick the fields they need.
    async fn trigger_number_purchase(&self, payload: &serde_json::Value) -> Result<WorkflowAck>;
}
