use crate::error::Result;
use crate::models::SignupSnapshot;

use super::{CheckoutProvider, METADATA_FORM_DATA, METADATA_SELECTED_PLAN};

/// Outcome of verifying a checkout session by id.
///
/// `paid && form_data.is_none()` is a distinct state from not-paid: the
/// payment went through but the embedded snapshot was corrupt or missing,
/// so the caller cannot provision and must report it as an error.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub paid: bool,
    pub form_data: Option<SignupSnapshot>,
    pub selected_plan: Option<String>,
    pub customer_email: Option<String>,
    pub amount_total: Option<i64>,
}

/// Retrieve a checkout session and decide paid/unpaid.
///
/// A pure read against the provider; safe to call repeatedly for the same
/// session id (browser reloads of the return URL replay it).
pub async fn verify_session(
    provider: &dyn CheckoutProvider,
    session_id: &str,
) -> Result<VerifiedPayment> {
    let session = provider.retrieve_checkout_session(session_id).await?;
    let paid = session.is_paid();

    let mut form_data = None;
    let mut selected_plan = None;

    if paid {
        match session.metadata.get(METADATA_FORM_DATA) {
            Some(raw) => match serde_json::from_str::<SignupSnapshot>(raw) {
                Ok(snapshot) => form_data = Some(snapshot),
                Err(e) => {
                    tracing::error!(
                        session_id = %session.id,
                        "Failed to parse signup data from session metadata: {}",
                        e
                    );
                }
            },
            None => {
                tracing::error!(session_id = %session.id, "Paid session has no signup metadata");
            }
        }
        selected_plan = session.metadata.get(METADATA_SELECTED_PLAN).cloned();
    }

    Ok(VerifiedPayment {
        paid,
        form_data,
        selected_plan,
        customer_email: session.customer_email,
        amount_total: session.amount_total,
    })
}
