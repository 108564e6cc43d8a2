//! Seller API
//!
//! | 路径 | 方法 | 认证 |
//! |------|------|------|
//! | /api/seller/products | POST | 卖家 |
//! | /api/seller/orders | GET | 卖家 |

mod handler;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use shared::models::Role;

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/seller", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/products", post(handler::create_product))
        .route("/orders", get(handler::list_orders))
        .route_layer(middleware::from_fn(require_role(Role::Seller)))
}
