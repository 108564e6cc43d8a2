//! ReviewService

use shared::models::{
    Eligibility, IneligibleReason, MAX_RATING, MIN_RATING, Review, ReviewCreate, ReviewUpdate,
};
use shared::util::{new_id, now_millis};
use std::sync::Arc;

use super::eligibility::can_review;
use super::error::ReviewError;
use crate::db::{AggregateLocks, MarketStore, StoreError};

fn check_rating(rating: u8) -> Result<u8, ReviewError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(ReviewError::InvalidRating(rating))
    }
}

fn product_key(product_id: &str) -> String {
    format!("product:{product_id}")
}

#[derive(Debug, Clone)]
pub struct ReviewService {
    store: Arc<dyn MarketStore>,
    locks: Arc<AggregateLocks>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn MarketStore>, locks: Arc<AggregateLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn eligibility(
        &self,
        buyer_id: &str,
        product_id: &str,
    ) -> Result<Eligibility, ReviewError> {
        Ok(can_review(self.store.as_ref(), buyer_id, product_id).await?)
    }

    pub async fn list(&self, product_id: &str) -> Result<Vec<Review>, ReviewError> {
        if self.store.get_product(product_id).await?.is_none() {
            return Err(ReviewError::ProductNotFound(product_id.to_string()));
        }
        Ok(self.store.list_reviews(product_id).await?)
    }

    /// Create the buyer's review and refresh the product rating
    pub async fn submit(
        &self,
        buyer_id: &str,
        product_id: &str,
        input: ReviewCreate,
    ) -> Result<Review, ReviewError> {
        let rating = check_rating(input.rating)?;
        if self.store.get_product(product_id).await?.is_none() {
            return Err(ReviewError::ProductNotFound(product_id.to_string()));
        }

        let _guard = self.locks.acquire(&product_key(product_id)).await;

        if let Eligibility::Ineligible(reason) =
            can_review(self.store.as_ref(), buyer_id, product_id).await?
        {
            return Err(ReviewError::Ineligible(reason));
        }

        let now = now_millis();
        let review = Review {
            id: new_id(),
            product_id: product_id.to_string(),
            buyer_id: buyer_id.to_string(),
            rating,
            comment: input.comment.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        let summary = match self.store.create_review(&review).await {
            Ok(summary) => summary,
            // Another instance got there first
            Err(StoreError::Conflict(_)) => {
                return Err(ReviewError::Ineligible(IneligibleReason::AlreadyReviewed));
            }
            Err(StoreError::NotFound { .. }) => {
                return Err(ReviewError::ProductNotFound(product_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            product_id = %product_id,
            buyer_id = %buyer_id,
            rating,
            review_count = summary.review_count,
            "Review submitted"
        );
        Ok(review)
    }

    /// Change rating and/or comment of the buyer's own review
    pub async fn update(
        &self,
        buyer_id: &str,
        review_id: &str,
        input: ReviewUpdate,
    ) -> Result<Review, ReviewError> {
        let rating = input.rating.map(check_rating).transpose()?;
        let product_id = self.owned(buyer_id, review_id).await?.product_id;

        let _guard = self.locks.acquire(&product_key(&product_id)).await;

        // Re-read under the lock, a delete may have won
        let mut review = self.owned(buyer_id, review_id).await?;
        if let Some(rating) = rating {
            review.rating = rating;
        }
        if let Some(comment) = input.comment {
            review.comment = comment.trim().to_string();
        }
        review.updated_at = now_millis().max(review.updated_at);
        let summary = match self.store.update_review(&review).await {
            Ok(summary) => summary,
            Err(StoreError::NotFound { .. }) => {
                return Err(ReviewError::NotFound(review_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            review_id = %review_id,
            product_id = %product_id,
            rating = summary.rating,
            "Review updated"
        );
        Ok(review)
    }

    /// Remove the buyer's own review
    pub async fn delete(&self, buyer_id: &str, review_id: &str) -> Result<(), ReviewError> {
        let product_id = self.owned(buyer_id, review_id).await?.product_id;

        let _guard = self.locks.acquire(&product_key(&product_id)).await;

        self.owned(buyer_id, review_id).await?;
        let summary = match self.store.delete_review(review_id).await {
            Ok((_, summary)) => summary,
            Err(StoreError::NotFound { .. }) => {
                return Err(ReviewError::NotFound(review_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            review_id = %review_id,
            product_id = %product_id,
            review_count = summary.review_count,
            "Review deleted"
        );
        Ok(())
    }

    /// Review `review_id` if it belongs to `buyer_id`. Someone else's review
    /// reads as missing.
    async fn owned(&self, buyer_id: &str, review_id: &str) -> Result<Review, ReviewError> {
        match self.store.get_review(review_id).await? {
            Some(review) if review.buyer_id == buyer_id => Ok(review),
            _ => Err(ReviewError::NotFound(review_id.to_string())),
        }
    }
}
