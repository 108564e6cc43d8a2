//! Static classification of page paths

/// Pages anyone may open, signed in or not
const OPEN_PAGES: &[&str] = &["/", "/contact", "/privacy-policy", "/terms-conditions"];

/// Pages only for visitors who are not signed in
const GUEST_PAGES: &[&str] = &[
    "/login",
    "/login/buyer",
    "/login/seller",
    "/login/admin",
    "/signup",
    "/signup/buyer",
    "/signup/seller",
    "/forgot-password",
    "/reset-password",
    "/google",
];

/// Prefixes the page guard never looks at
const EXEMPT_PREFIXES: &[&str] = &["/api", "/health", "/static", "/assets", "/_next", "/favicon.ico"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Not a page: API, health check, static assets
    Exempt,
    Public,
    /// Login and signup pages
    PublicOnly,
    BuyerOnly,
    SellerOnly,
    AdminOnly,
    /// Any signed-in user
    Protected,
}

/// `path` equals `prefix` or continues it with a `/`
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn classify(path: &str) -> RouteClass {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    if EXEMPT_PREFIXES.iter().any(|prefix| under(path, prefix)) {
        RouteClass::Exempt
    } else if OPEN_PAGES.contains(&path) {
        RouteClass::Public
    } else if GUEST_PAGES.contains(&path) {
        RouteClass::PublicOnly
    } else if under(path, "/buyer") {
        RouteClass::BuyerOnly
    } else if under(path, "/seller") {
        RouteClass::SellerOnly
    } else if under(path, "/admin") {
        RouteClass::AdminOnly
    } else {
        RouteClass::Protected
    }
}
