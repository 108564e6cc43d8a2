//! Identity extractors
//!
//! `resolve_identity` puts the caller into request extensions; these
//! extractors hand it to handlers, typed by role where the handler needs it.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::{AppError, ErrorCode};
use shared::models::{Identity, Role};
use std::ops::Deref;

use super::middleware::TokenRejected;

/// The resolved caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Identity);

impl Deref for CurrentUser {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

fn current(parts: &Parts) -> Result<&Identity, AppError> {
    if let Some(user) = parts.extensions.get::<CurrentUser>() {
        return Ok(&user.0);
    }
    Err(match parts.extensions.get::<TokenRejected>() {
        Some(TokenRejected { expired: true }) => AppError::token_expired(),
        Some(_) => AppError::invalid_token("Invalid token"),
        None => AppError::not_authenticated(),
    })
}

fn wrong_role(identity: &Identity, required: Role) -> AppError {
    AppError::with_message(ErrorCode::RoleRequired, format!("{required} role required"))
        .with_detail("redirect", identity.home_path())
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current(parts).cloned().map(CurrentUser)
    }
}

/// Caller that must be a buyer; yields the buyer id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BuyerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = current(parts)?;
        identity
            .buyer_id()
            .map(|id| BuyerId(id.to_string()))
            .ok_or_else(|| wrong_role(identity, Role::Buyer))
    }
}

/// Caller that must be a seller; yields the seller id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for SellerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = current(parts)?;
        identity
            .seller_id()
            .map(|id| SellerId(id.to_string()))
            .ok_or_else(|| wrong_role(identity, Role::Seller))
    }
}
