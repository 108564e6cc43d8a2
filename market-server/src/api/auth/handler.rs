//! Authentication Handlers

use axum::{
    Json,
    extract::State,
    response::{AppendHeaders, IntoResponse},
};
use http::header::SET_COOKIE;
use shared::error::{ApiResponse, AppResult};
use shared::models::{AuthSession, UserInfo};

use crate::auth::CurrentUser;
use crate::auth::token::{clear_session_cookie, session_cookie};
use crate::core::ServerState;
use crate::services::{LoginRequest, SignupRequest};
use shared::util::now_millis;

fn with_cookie(state: &ServerState, session: AuthSession) -> impl IntoResponse + use<> {
    let max_age = ((session.expires_at - now_millis()) / 1000).max(0);
    let cookie = session_cookie(&session.token, max_age, state.config.is_production());
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(ApiResponse::success(session)),
    )
}

/// Register a buyer or seller
pub async fn signup(
    State(state): State<ServerState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    let session = state.accounts.signup(req).await?;
    Ok(with_cookie(&state, session))
}

/// Exchange credentials for a token (body and `token` cookie)
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let session = state.accounts.login(req).await?;
    Ok(with_cookie(&state, session))
}

pub async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Json(ApiResponse::ok()),
    )
}

pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<UserInfo>>> {
    let info = state.accounts.me(&user).await?;
    Ok(Json(ApiResponse::success(info)))
}
