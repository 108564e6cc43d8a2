//! Router assembly
//!
//! Middleware, outermost first:
//!
//! | Layer | Purpose |
//! |-------|---------|
//! | SetRequestId / PropagateRequestId | `x-request-id` on request and response |
//! | Timeout | `REQUEST_TIMEOUT_MS`, answered with the error envelope |
//! | Cors, Compression, Trace | tower-http |
//! | resolve_identity | token → `CurrentUser` |
//! | logging_middleware | one line per request |
//! | page_guard | page access control |

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use shared::error::AppError;
use std::time::Duration;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower::{BoxError, ServiceBuilder};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api;
use crate::auth::{page_guard, resolve_identity};
use crate::core::ServerState;
use crate::middleware::logging_middleware;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

async fn not_found() -> AppError {
    AppError::not_found("Route")
}

async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request timed out");
        AppError::timeout()
    } else {
        AppError::internal(format!("Unhandled middleware error: {err}"))
    }
}

/// Abort requests running longer than `timeout`
fn with_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Public
        .merge(api::health::router())
        .merge(api::auth::router())
        .merge(api::products::router())
        // Role gated
        .merge(api::seller::router())
        .merge(api::cart::router())
        .merge(api::checkout::router())
        .merge(api::orders::router())
        .merge(api::reviews::router())
        .merge(api::notifications::router())
        .merge(api::admin::router())
        // Pages
        .merge(api::pages::router())
        .fallback(not_found)
}

/// Build a fully configured application with all middleware
///
/// Used by the HTTP server and by integration tests (`oneshot`).
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);

    let app = build_router()
        // ========== Application Middleware ==========
        .layer(axum_middleware::from_fn(page_guard))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            resolve_identity,
        ))
        // ========== Tower HTTP Middleware ==========
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    with_timeout(app, timeout)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
}
