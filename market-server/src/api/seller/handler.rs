//! Seller API Handlers

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use shared::error::{ApiResponse, AppResult};
use shared::models::{OrderPage, OrderQuery, Product, ProductCreate};

use crate::auth::{CurrentUser, SellerId};
use crate::core::ServerState;

pub async fn create_product(
    State(state): State<ServerState>,
    SellerId(seller_id): SellerId,
    Json(input): Json<ProductCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let product = state.catalog.create(&seller_id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// Orders containing at least one of the seller's items
pub async fn list_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<ApiResponse<OrderPage>>> {
    let page = state.orders.list(&user, &query).await?;
    Ok(Json(ApiResponse::success(page)))
}
