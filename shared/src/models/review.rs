//! Review Model

use serde::{Deserialize, Serialize};

/// Lowest accepted rating
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating
pub const MAX_RATING: u8 = 5;

/// A buyer's review of a product. Unique per (product, buyer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub buyer_id: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Submit review payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCreate {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// Update review payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

/// Why a buyer may not review a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    NotPurchasedOrNotDelivered,
    AlreadyReviewed,
}

impl IneligibleReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            IneligibleReason::NotPurchasedOrNotDelivered => "not purchased or not delivered",
            IneligibleReason::AlreadyReviewed => "already reviewed",
        }
    }
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the review eligibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(IneligibleReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Wire form of [`Eligibility`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityView {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Eligibility> for EligibilityView {
    fn from(value: Eligibility) -> Self {
        match value {
            Eligibility::Eligible => Self {
                eligible: true,
                reason: None,
            },
            Eligibility::Ineligible(reason) => Self {
                eligible: false,
                reason: Some(reason.to_string()),
            },
        }
    }
}
