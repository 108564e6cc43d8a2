//! Authentication and access control
//!
//! - [`JwtService`] - issues and resolves identity tokens
//! - [`authorize`] - access guard for page paths
//! - [`CurrentUser`], [`BuyerId`], [`SellerId`] - extractors
//! - [`resolve_identity`], [`page_guard`], [`require_auth`], [`require_role`] - middleware

pub mod extractor;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod route_table;
pub mod token;

pub use extractor::{BuyerId, CurrentUser, SellerId};
pub use guard::{AccessDecision, authorize};
pub use jwt::{Claims, IssuedToken, JwtConfig, JwtError, JwtService};
pub use middleware::{page_guard, require_auth, require_role, resolve_identity};
pub use token::token_from_headers;
