//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest listable price (`NUMERIC(12, 2)`)
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Decimal places a price may carry
pub const PRICE_SCALE: u32 = 2;

/// Positive, at most [`MAX_PRICE`], at most [`PRICE_SCALE`] decimal places
pub fn is_valid_price(price: Decimal) -> bool {
    price > Decimal::ZERO && price <= MAX_PRICE && price.normalize().scale() <= PRICE_SCALE
}

/// Catalogue entry owned by one seller
///
/// `rating` and `review_count` are derived from the product's reviews and are
/// only written by the review service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    /// Mean of all review ratings, 0 when unreviewed
    pub rating: f64,
    pub review_count: u32,
    pub created_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
}

/// Aggregate written back after any review change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub rating: f64,
    pub review_count: u32,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        rating: 0.0,
        review_count: 0,
    };

    /// Mean over the given ratings
    pub fn from_ratings(ratings: impl IntoIterator<Item = u8>) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u32), |(sum, count), r| (sum + u64::from(r), count + 1));
        if count == 0 {
            return Self::EMPTY;
        }
        Self {
            rating: sum as f64 / f64::from(count),
            review_count: count,
        }
    }
}
