//! Market Server - 多卖家电商平台后端
//!
//! # 架构概述
//!
//! - **认证** (`auth`): JWT 身份解析、页面访问守卫、API 角色门禁
//! - **订单** (`orders`): 订单状态机与并发安全的状态流转
//! - **评价** (`reviews`): 评价资格检查与商品评分维护
//! - **服务** (`services`): 账户、商品、购物车、下单
//! - **存储** (`db`): PostgreSQL / 内存存储, 按聚合加锁
//! - **HTTP API** (`api`): RESTful API 与页面
//!
//! # 模块结构
//!
//! ```text
//! market-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── auth/          # JWT、令牌来源、访问守卫、中间件
//! ├── db/            # 存储抽象、PostgreSQL、内存实现、锁
//! ├── orders/        # 状态机、OrdersManager、库存释放
//! ├── reviews/       # 评价资格、ReviewService
//! ├── services/      # 账户、商品、购物车、下单
//! ├── api/           # HTTP 路由和处理器
//! ├── routes/        # 路由装配与中间件栈
//! ├── middleware/    # 请求日志
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod middleware;
pub mod orders;
pub mod reviews;
pub mod routes;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::OrdersManager;
pub use reviews::ReviewService;
pub use routes::{build_app, build_router};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
