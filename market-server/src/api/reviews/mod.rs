//! Review API (买家, 仅限本人评价)
//!
//! | 路径 | 方法 |
//! |------|------|
//! | /api/reviews/{id} | PUT |
//! | /api/reviews/{id} | DELETE |

mod handler;

use axum::{Router, middleware, routing::put};
use shared::models::Role;

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reviews", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route_layer(middleware::from_fn(require_role(Role::Buyer)))
}
