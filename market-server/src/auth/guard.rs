//! Access guard for page requests
//!
//! | Caller | Path | Decision |
//! |--------|------|----------|
//! | anonymous | not public | redirect `/login` |
//! | signed in | login / signup | redirect role home |
//! | SELLER | buyer or admin pages | redirect `/seller` |
//! | BUYER | seller or admin pages | redirect `/buyer` |
//! | ADMIN | buyer or seller pages | redirect `/admin` |

use shared::models::{Identity, Role};

use super::route_table::{RouteClass, classify};

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Redirect(&'static str),
}

/// Decide whether `identity` may open the page at `path`
pub fn authorize(identity: Option<&Identity>, path: &str) -> AccessDecision {
    let class = classify(path);
    let Some(identity) = identity else {
        return match class {
            RouteClass::Exempt | RouteClass::Public | RouteClass::PublicOnly => {
                AccessDecision::Allow
            }
            _ => AccessDecision::Redirect(LOGIN_PATH),
        };
    };

    let role = identity.role();
    let allowed = match class {
        RouteClass::PublicOnly => false,
        RouteClass::BuyerOnly => role == Role::Buyer,
        RouteClass::SellerOnly => role == Role::Seller,
        RouteClass::AdminOnly => role == Role::Admin,
        RouteClass::Exempt | RouteClass::Public | RouteClass::Protected => true,
    };

    if allowed {
        AccessDecision::Allow
    } else {
        AccessDecision::Redirect(role.home_path())
    }
}
