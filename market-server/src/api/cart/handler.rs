//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{ApiResponse, AppResult};
use shared::models::{Cart, CartItemCreate, CartItemUpdate};

use crate::auth::BuyerId;
use crate::core::ServerState;

pub async fn get(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
) -> AppResult<Json<ApiResponse<Cart>>> {
    Ok(Json(ApiResponse::success(state.carts.get(&buyer_id).await?)))
}

pub async fn add_item(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
    Json(input): Json<CartItemCreate>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    Ok(Json(ApiResponse::success(state.carts.add(&buyer_id, input).await?)))
}

pub async fn update_item(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
    Path(id): Path<String>,
    Json(input): Json<CartItemUpdate>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let cart = state.carts.update(&buyer_id, &id, input.quantity).await?;
    Ok(Json(ApiResponse::success(cart)))
}

pub async fn remove_item(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    Ok(Json(ApiResponse::success(state.carts.remove(&buyer_id, &id).await?)))
}

pub async fn clear(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
) -> AppResult<Json<ApiResponse<Cart>>> {
    Ok(Json(ApiResponse::success(state.carts.clear(&buyer_id).await?)))
}
