//! Checkout API
//!
//! `POST /api/checkout` (买家): 购物车 → PENDING 订单

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::post,
};
use shared::error::{ApiResponse, AppResult};
use shared::models::{Order, Role};

use crate::auth::{BuyerId, require_role};
use crate::core::ServerState;
use crate::services::CheckoutRequest;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/checkout", post(checkout))
        .route_layer(middleware::from_fn(require_role(Role::Buyer)))
}

async fn checkout(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let order = state.checkout.checkout(&buyer_id, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}
