//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::error::{ApiResponse, AppResult};
use shared::models::{Order, OrderPage, OrderQuery, OrderTracking, StatusChangeRequest};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text};

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.orders.get(&id, &user).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Move an order to a new status
///
/// Sellers of the order move it forward. The buyer may cancel before
/// shipping; admins may cancel at any point before delivery.
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<StatusChangeRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    validate_optional_text(&req.note, "note", MAX_NOTE_LEN)?;
    validate_optional_text(&req.location, "location", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.tracking_number, "trackingNumber", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.carrier, "carrier", MAX_SHORT_TEXT_LEN)?;

    let order = state.orders.transition(&id, req, &user).await?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn tracking(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderTracking>>> {
    let tracking = state.orders.tracking(&id, &user).await?;
    Ok(Json(ApiResponse::success(tracking)))
}

pub async fn list_buyer_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<ApiResponse<OrderPage>>> {
    let page = state.orders.list(&user, &query).await?;
    Ok(Json(ApiResponse::success(page)))
}
