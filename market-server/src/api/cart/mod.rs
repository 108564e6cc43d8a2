//! Cart API (买家)
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/cart | GET | 查看购物车 |
//! | /api/cart | DELETE | 清空 |
//! | /api/cart/items | POST | 添加商品 (同商品合并数量) |
//! | /api/cart/items/{id} | PUT | 修改数量 |
//! | /api/cart/items/{id} | DELETE | 删除一行 |

mod handler;

use axum::{
    Router,
    middleware,
    routing::{get, post, put},
};
use shared::models::Role;

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get).delete(handler::clear))
        .route("/items", post(handler::add_item))
        .route(
            "/items/{id}",
            put(handler::update_item).delete(handler::remove_item),
        )
        .route_layer(middleware::from_fn(require_role(Role::Buyer)))
}
