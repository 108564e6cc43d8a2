//! Admin API
//!
//! | 路径 | 方法 | 认证 |
//! |------|------|------|
//! | /api/admin/orders | GET | 管理员 |

use axum::{
    Json, Router,
    extract::{Query, State},
    middleware,
    routing::get,
};
use shared::error::{ApiResponse, AppResult};
use shared::models::{OrderPage, OrderQuery, Role};

use crate::auth::{CurrentUser, require_role};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route_layer(middleware::from_fn(require_role(Role::Admin)))
}

/// Every order in the marketplace, newest first
async fn list_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<ApiResponse<OrderPage>>> {
    let page = state.orders.list(&user, &query).await?;
    Ok(Json(ApiResponse::success(page)))
}
