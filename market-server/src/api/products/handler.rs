//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::error::{ApiResponse, AppError, AppResult};
use shared::models::{EligibilityView, Product, Review, ReviewCreate};

use crate::auth::BuyerId;
use crate::core::ServerState;
use crate::utils::validation::MAX_NOTE_LEN;

pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = state.catalog.get(&id).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Reviews of a product, newest first
pub async fn list_reviews(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Review>>>> {
    let reviews = state.reviews.list(&id).await?;
    Ok(Json(ApiResponse::success(reviews)))
}

pub async fn eligibility(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<EligibilityView>>> {
    let eligibility = state.reviews.eligibility(&buyer_id, &id).await?;
    Ok(Json(ApiResponse::success(eligibility.into())))
}

pub async fn submit_review(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
    Path(id): Path<String>,
    Json(input): Json<ReviewCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    if input.comment.len() > MAX_NOTE_LEN {
        return Err(AppError::validation(format!(
            "comment is too long ({} chars, max {MAX_NOTE_LEN})",
            input.comment.len()
        ))
        .with_detail("field", "comment"));
    }
    let review = state.reviews.submit(&buyer_id, &id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(review))))
}
