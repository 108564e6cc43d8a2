use shared::error::{AppError, ErrorCode};
use shared::models::{IneligibleReason, MAX_RATING, MIN_RATING};
use thiserror::Error;

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Cannot review: {0}")]
    Ineligible(IneligibleReason),

    #[error("Rating must be between {MIN_RATING} and {MAX_RATING}, got {0}")]
    InvalidRating(u8),

    #[error("Review not found: {0}")]
    NotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Ineligible(reason) => {
                let code = match reason {
                    IneligibleReason::NotPurchasedOrNotDelivered => ErrorCode::ReviewNotPurchased,
                    IneligibleReason::AlreadyReviewed => ErrorCode::ReviewAlreadyExists,
                };
                AppError::with_message(code, reason.as_str()).with_detail("reason", reason.as_str())
            }
            ReviewError::InvalidRating(rating) => AppError::with_message(
                ErrorCode::InvalidRating,
                format!("Rating must be between {MIN_RATING} and {MAX_RATING}"),
            )
            .with_detail("rating", rating),
            ReviewError::NotFound(id) => {
                AppError::new(ErrorCode::ReviewNotFound).with_detail("reviewId", id)
            }
            ReviewError::ProductNotFound(id) => {
                AppError::new(ErrorCode::ProductNotFound).with_detail("productId", id)
            }
            ReviewError::Storage(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_ineligible_carries_reason() {
        let err: AppError =
            ReviewError::Ineligible(IneligibleReason::NotPurchasedOrNotDelivered).into();
        assert_eq!(err.code, ErrorCode::ReviewNotPurchased);
        assert_eq!(err.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(err.detail_str("reason"), Some("not purchased or not delivered"));

        let err: AppError = ReviewError::Ineligible(IneligibleReason::AlreadyReviewed).into();
        assert_eq!(err.code, ErrorCode::ReviewAlreadyExists);
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
        assert_eq!(err.message, "already reviewed");
    }

    #[test]
    fn test_invalid_rating_is_bad_request() {
        let err: AppError = ReviewError::InvalidRating(9).into();
        assert_eq!(err.code, ErrorCode::InvalidRating);
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
    }
}
