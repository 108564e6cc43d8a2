//! 页面路由
//!
//! 页面本身只是占位 HTML, 访问控制全部由 `page_guard` 在进入这里之前完成。
//!
//! | 路径 | 访问 |
//! |------|------|
//! | /, /contact, /privacy-policy, /terms-conditions | 所有人 |
//! | /login*, /signup*, /forgot-password, /reset-password, /google | 仅未登录 |
//! | /buyer/** | 买家 |
//! | /seller/** | 卖家 |
//! | /admin/** | 管理员 |
//! | 其他页面 | 任意已登录用户 |

use axum::{
    Extension, Router,
    http::Uri,
    response::Html,
    routing::get,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;

const PAGES: &[&str] = &[
    "/",
    "/contact",
    "/privacy-policy",
    "/terms-conditions",
    "/login",
    "/login/{role}",
    "/signup",
    "/signup/{role}",
    "/forgot-password",
    "/reset-password",
    "/google",
    "/buyer",
    "/buyer/{*rest}",
    "/seller",
    "/seller/{*rest}",
    "/admin",
    "/admin/{*rest}",
    "/account",
    "/orders/{*rest}",
];

pub fn router() -> Router<ServerState> {
    PAGES
        .iter()
        .fold(Router::new(), |router, path| router.route(path, get(render)))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn render(uri: Uri, user: Option<Extension<CurrentUser>>) -> Html<String> {
    let path = escape(uri.path());
    let viewer = match user {
        Some(Extension(user)) => format!("{} ({})", escape(user.user_id()), user.role()),
        None => "guest".to_string(),
    };
    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{path}</title></head>\
         <body><main data-path=\"{path}\"><p>Signed in as {viewer}</p></main></body></html>"
    ))
}
