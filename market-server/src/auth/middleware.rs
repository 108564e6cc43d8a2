//! Authentication middleware
//!
//! - [`resolve_identity`]: decode the token once, attach [`CurrentUser`]
//! - [`page_guard`]: access guard for page requests
//! - [`require_auth`] / [`require_role`]: API gates

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use shared::error::{AppError, ErrorCode};
use shared::models::Role;

use super::extractor::CurrentUser;
use super::guard::{AccessDecision, authorize};
use super::jwt::JwtError;
use super::token::token_from_headers;
use crate::core::ServerState;
use crate::security_log;

/// A token was presented but did not resolve
#[derive(Debug, Clone, Copy)]
pub struct TokenRejected {
    pub expired: bool,
}

/// Resolve the identity token, if any, into a [`CurrentUser`] extension.
///
/// Never rejects: anonymous requests continue without the extension and the
/// gates further in decide what that means.
pub async fn resolve_identity(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Response {
    let resolved = token_from_headers(req.headers()).map(|token| state.jwt_service.resolve(token));

    match resolved {
        Some(Ok(identity)) => {
            req.extensions_mut().insert(CurrentUser(identity));
        }
        Some(Err(e)) => {
            security_log!(
                "WARN",
                "token_rejected",
                error = e.to_string(),
                path = req.uri().path().to_string()
            );
            req.extensions_mut().insert(TokenRejected {
                expired: matches!(e, JwtError::Expired),
            });
        }
        None => {}
    }

    next.run(req).await
}

/// Page requests: allow or redirect
pub async fn page_guard(req: Request, next: Next) -> Response {
    if req.method() == http::Method::OPTIONS {
        return next.run(req).await;
    }

    let identity = req.extensions().get::<CurrentUser>().map(|u| &u.0);
    match authorize(identity, req.uri().path()) {
        AccessDecision::Allow => next.run(req).await,
        AccessDecision::Redirect(target) => {
            security_log!(
                "INFO",
                "page_redirect",
                path = req.uri().path().to_string(),
                role = identity.map(|i| i.role().as_str()).unwrap_or("ANONYMOUS"),
                redirect = target
            );
            Redirect::to(target).into_response()
        }
    }
}

fn unauthenticated(req: &Request) -> AppError {
    match req.extensions().get::<TokenRejected>() {
        Some(TokenRejected { expired: true }) => AppError::token_expired(),
        Some(TokenRejected { expired: false }) => AppError::invalid_token("Invalid token"),
        None => AppError::not_authenticated(),
    }
}

/// API gate: a valid identity is required
///
/// | Failure | Status |
/// |---------|--------|
/// | no token | 401 NotAuthenticated |
/// | expired token | 401 TokenExpired |
/// | bad token | 401 TokenInvalid |
pub async fn require_auth(req: Request, next: Next) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }
    if req.extensions().get::<CurrentUser>().is_none() {
        security_log!("WARN", "auth_missing", path = req.uri().path().to_string());
        return Err(unauthenticated(&req));
    }
    Ok(next.run(req).await)
}

/// API gate: the caller must hold `role`
///
/// ```ignore
/// Router::new()
///     .route("/products", post(handler::create))
///     .route_layer(middleware::from_fn(require_role(Role::Seller)));
/// ```
///
/// Wrong role answers 403 with `details.redirect` set to the caller's home.
pub fn require_role(
    role: Role,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let Some(user) = req.extensions().get::<CurrentUser>() else {
                return Err(unauthenticated(&req));
            };

            if user.role() != role {
                security_log!(
                    "WARN",
                    "role_required",
                    user_id = user.user_id().to_string(),
                    user_role = user.role().as_str(),
                    required_role = role.as_str()
                );
                let code = if role == Role::Admin {
                    ErrorCode::AdminRequired
                } else {
                    ErrorCode::RoleRequired
                };
                return Err(AppError::with_message(code, format!("{role} role required"))
                    .with_detail("redirect", user.home_path()));
            }

            Ok(next.run(req).await)
        })
    }
}
