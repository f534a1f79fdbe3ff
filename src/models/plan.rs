use serde::{Deserialize, Serialize};

/// Purchasable subscription plans.
///
/// This table is the server-side source of truth for pricing; the client only
/// ever sends the identifier. The marketing site also shows a growth tier and
/// pay-as-you-go pricing, but those are display-only and intentionally not
/// representable here - an unknown identifier is a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Pro,
}

impl Plan {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "starter" => Some(Plan::Starter),
            "pro" => Some(Plan::Pro),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Pro => "pro",
        }
    }

    /// Price in USD minor units (cents).
    pub fn amount_cents(&self) -> i64 {
        match self {
            Plan::Starter => 9900,
            Plan::Pro => 37500,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Starter => "Starter",
            Plan::Pro => "Pro",
        }
    }

    /// Checkout line-item description shown on the hosted payment page.
    pub fn checkout_description(&self) -> &'static str {
        match self {
            Plan::Starter => "Monthly subscription - 40 calls included",
            Plan::Pro => "Monthly subscription - 160 calls included",
        }
    }
}
