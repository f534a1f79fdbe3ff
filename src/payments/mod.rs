mod stripe;
mod verify;

pub use stripe::*;
pub use verify::*;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// The payment provider's canonical "paid" value. Anything else
/// (unpaid, no_payment_required, processing, expired) is treated as not paid.
pub const PAYMENT_STATUS_PAID: &str = "paid";

/// Metadata key holding the JSON-serialized signup snapshot.
pub const METADATA_FORM_DATA: &str = "form_data";
/// Metadata key holding the selected plan identifier.
pub const METADATA_SELECTED_PLAN: &str = "selected_plan";

/// Request to create a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckout {
    pub amount_cents: i64,
    pub product_name: String,
    pub product_description: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Opaque key/value pairs echoed back on retrieval. This is the sole
    /// persistence mechanism for form data between submission and payment
    /// confirmation.
    pub metadata: HashMap<String, String>,
}

/// The slice of a provider checkout session this service reads.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted checkout URL; present on freshly created sessions.
    pub url: Option<String>,
    pub payment_status: String,
    pub customer_email: Option<String>,
    pub amount_total: Option<i64>,
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PAYMENT_STATUS_PAID
    }
}

/// Hosted-checkout provider seam.
///
/// `retrieve_checkout_session` must be a pure read: the browser may reload
/// the return URL and replay the retrieval any number of times.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    async fn create_checkout_session(&self, request: &CreateCheckout) -> Result<CheckoutSession>;

    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession>;
}
