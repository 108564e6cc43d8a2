//! Review eligibility check

use shared::models::{Eligibility, IneligibleReason, OrderStatus};

use crate::db::{MarketStore, OrderItemFilter, StoreResult};

/// Whether `buyer_id` may review `product_id` right now.
///
/// Read-only: calling it twice without a submit in between gives the same
/// answer.
pub async fn can_review(
    store: &dyn MarketStore,
    buyer_id: &str,
    product_id: &str,
) -> StoreResult<Eligibility> {
    let delivered = store
        .find_order_items(&OrderItemFilter {
            buyer_id: Some(buyer_id.to_string()),
            product_id: Some(product_id.to_string()),
            seller_id: None,
            status: Some(OrderStatus::Delivered),
        })
        .await?;
    if delivered.is_empty() {
        return Ok(Eligibility::Ineligible(
            IneligibleReason::NotPurchasedOrNotDelivered,
        ));
    }

    if store.find_review(product_id, buyer_id).await?.is_some() {
        return Ok(Eligibility::Ineligible(IneligibleReason::AlreadyReviewed));
    }

    Ok(Eligibility::Eligible)
}
