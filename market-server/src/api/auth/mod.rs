//! Auth API
//!
//! | 路径 | 方法 | 认证 |
//! |------|------|------|
//! | /api/auth/signup | POST | 无 |
//! | /api/auth/login | POST | 无 |
//! | /api/auth/logout | POST | 无 |
//! | /api/auth/me | GET | 需要 |

mod handler;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};

use crate::auth::require_auth;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let public = Router::new()
        .route("/signup", post(handler::signup))
        .route("/login", post(handler::login))
        .route("/logout", post(handler::logout));

    let protected = Router::new()
        .route("/me", get(handler::me))
        .route_layer(middleware::from_fn(require_auth));

    Router::new().nest("/api/auth", public.merge(protected))
}
