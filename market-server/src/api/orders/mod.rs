//! Order API
//!
//! | 路径 | 方法 | 认证 |
//! |------|------|------|
//! | /api/orders/{id} | GET | 订单参与方 / 管理员 |
//! | /api/orders/{id}/status | POST | 订单参与方 / 管理员 (按状态机授权) |
//! | /api/orders/{id}/tracking | GET | 订单参与方 / 管理员 |
//! | /api/buyer/orders | GET | 买家 |

mod handler;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use shared::models::Role;

use crate::auth::{require_auth, require_role};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/orders", routes())
        .nest("/api/buyer", buyer_routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", post(handler::update_status))
        .route("/{id}/tracking", get(handler::tracking))
        .route_layer(middleware::from_fn(require_auth))
}

fn buyer_routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(handler::list_buyer_orders))
        .route_layer(middleware::from_fn(require_role(Role::Buyer)))
}
