//! Review API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{ApiResponse, AppResult};
use shared::models::{Review, ReviewUpdate};

use crate::auth::BuyerId;
use crate::core::ServerState;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};

pub async fn update(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
    Path(id): Path<String>,
    Json(input): Json<ReviewUpdate>,
) -> AppResult<Json<ApiResponse<Review>>> {
    validate_optional_text(&input.comment, "comment", MAX_NOTE_LEN)?;
    let review = state.reviews.update(&buyer_id, &id, input).await?;
    Ok(Json(ApiResponse::success(review)))
}

pub async fn delete(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.reviews.delete(&buyer_id, &id).await?;
    Ok(Json(ApiResponse::ok()))
}
