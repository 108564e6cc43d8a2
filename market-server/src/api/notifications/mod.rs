//! Notification API (买家)
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/notifications | GET | 订单状态变更通知，最新在前 |

use axum::{Json, Router, extract::State, middleware, routing::get};
use shared::error::{ApiResponse, AppResult};
use shared::models::{Notification, Role};

use crate::auth::{BuyerId, require_role};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/notifications", get(list))
        .route_layer(middleware::from_fn(require_role(Role::Buyer)))
}

async fn list(
    State(state): State<ServerState>,
    BuyerId(buyer_id): BuyerId,
) -> AppResult<Json<ApiResponse<Vec<Notification>>>> {
    let notifications = state.store.list_notifications(&buyer_id).await?;
    Ok(Json(ApiResponse::success(notifications)))
}
