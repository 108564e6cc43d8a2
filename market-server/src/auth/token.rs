//! Where a request carries its identity token
//!
//! Sources, first match wins: cookie `token`, cookie `auth-token`,
//! `Authorization: Bearer <token>`.

use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};

pub const TOKEN_COOKIE: &str = "token";
pub const LEGACY_TOKEN_COOKIE: &str = "auth-token";

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Strip the `Bearer ` prefix
pub fn bearer(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, TOKEN_COOKIE)
        .or_else(|| cookie_value(headers, LEGACY_TOKEN_COOKIE))
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(bearer)
        })
}

/// `Set-Cookie` value storing the session token
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value removing the session token
pub fn clear_session_cookie() -> String {
    format!("{TOKEN_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
