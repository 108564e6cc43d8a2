//! Product API
//!
//! | 路径 | 方法 | 认证 |
//! |------|------|------|
//! | /api/products/{id} | GET | 无 |
//! | /api/products/{id}/reviews | GET | 无 |
//! | /api/products/{id}/reviews | POST | 买家 |
//! | /api/products/{id}/review-eligibility | GET | 买家 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    // Buyer-only handlers take a `BuyerId`, which rejects everyone else
    Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route(
            "/{id}/reviews",
            get(handler::list_reviews).post(handler::submit_review),
        )
        .route("/{id}/review-eligibility", get(handler::eligibility))
}
